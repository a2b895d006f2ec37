use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
  cache::CacheKey,
  http::{error::OptionExt, Actor, Error},
  models::{DbUser, UserSetting},
  projection::resolve_image_url,
  types, App,
};

#[derive(Debug, Error)]
#[error("User not found")]
struct UserNotFound;

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUser {
  pub username: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSetting {
  pub name: String,
  /// Stored as text. Strings are kept as they are, anything else is
  /// stored as its JSON representation.
  #[schema(value_type = Object)]
  pub value: serde_json::Value,
}

impl UpdateSetting {
  fn value_as_text(&self) -> String {
    match &self.value {
      serde_json::Value::String(value) => value.clone(),
      other => other.to_string(),
    }
  }
}

/// Loads the user row, going through the user cache first.
async fn load_user(app: &App, firebase_id: &str) -> Result<DbUser, Error> {
  if let Some(user) = app.cache_get::<DbUser>(CacheKey::User, firebase_id).await {
    return Ok(user);
  }

  let mut conn = app.db_read_prefer_primary().await?;
  let user = DbUser::by_firebase_id(&mut conn, firebase_id)
    .await?
    .or_not_found(UserNotFound)?;
  drop(conn);

  app.cache_set(CacheKey::User, firebase_id, &user).await;
  Ok(user)
}

#[utoipa::path(
  get,
  path = "/users/@me",
  tag = "users",
  responses(
    (status = 200, description = "The logged in user", body = CurrentUser),
    (status = 401, description = "Not logged in", body = types::Error),
    (status = 404, description = "No user row for this account", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let viewer = actor.get_user()?;
  let user = load_user(&app, &viewer.firebase_id).await?;

  Ok(HttpResponse::Ok().json(CurrentUser {
    username: user.username,
    avatar_url: user.avatar_reference_id.as_deref().map(resolve_image_url),
  }))
}

#[utoipa::path(
  get,
  path = "/users/@me/settings",
  tag = "users",
  responses(
    (status = 200, description = "Settings of the logged in user", body = [UserSetting]),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn settings(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let viewer = actor.get_user()?;

  let mut conn = app.db_read_prefer_primary().await?;
  let settings = UserSetting::list(&mut conn, &viewer.firebase_id).await?;

  Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
  patch,
  path = "/users/@me/settings",
  tag = "users",
  request_body = UpdateSetting,
  responses(
    (status = 200, description = "Settings after the update", body = [UserSetting]),
    (status = 400, description = "Unknown setting", body = types::Error),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor, form), fields(name = %form.name))]
pub async fn update_settings(
  app: web::Data<App>,
  actor: Actor,
  form: web::Json<UpdateSetting>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, Error)]
  #[error("Unknown setting")]
  struct UnknownSetting;

  let viewer = actor.get_user()?;

  let mut conn = app.db_write().await?;
  if UserSetting::setting_type(&mut conn, &form.name).await?.is_none() {
    let message = format!("unknown setting {:?}", form.name);
    return Err(Error::from_context(types::Error::bad_request(message), UnknownSetting));
  }

  UserSetting::update(&mut conn, &viewer.firebase_id, &form.name, &form.value_as_text()).await?;
  let settings = UserSetting::list(&mut conn, &viewer.firebase_id).await?;
  drop(conn);

  app.cache_del(CacheKey::User, &viewer.firebase_id).await;
  Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
  post,
  path = "/users/@me/notifications/dismiss",
  tag = "users",
  responses(
    (status = 204, description = "Notifications dismissed"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn dismiss_notifications(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let viewer = actor.get_user()?;

  let mut conn = app.db_write().await?;
  DbUser::dismiss_notifications(&mut conn, &viewer.firebase_id).await?;

  Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn setting_values_become_text() {
    let form: UpdateSetting = serde_json::from_value(json!({ "name": "FESTIVE_BACKGROUND_HEADER", "value": true })).unwrap();
    assert_eq!(form.value_as_text(), "true");

    let form: UpdateSetting = serde_json::from_value(json!({ "name": "theme", "value": "dark" })).unwrap();
    assert_eq!(form.value_as_text(), "dark");
  }

  #[test]
  fn missing_avatar_is_absent() {
    let user = CurrentUser {
      username: "bobatan".into(),
      avatar_url: None,
    };
    assert_eq!(serde_json::to_value(user).unwrap(), json!({ "username": "bobatan" }));
  }
}
