use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
  database::ErrorExt,
  http::{error::OptionExt, Actor, Error, Viewer},
  models::{DbBoardActivity, DbBoardSummary, DbRealmInvite, DbUser, InviteDetails, RealmIds},
  projection::{process_boards_notifications, process_boards_summary},
  projection::{BoardNotifications, BoardSummary},
  schema::invites::{generate_nonce, InviteStatus},
  types::{
    self,
    permissions::{extract_permissions, has_permission},
    Permission, PermissionScope,
  },
  util::validation::is_valid_email,
  App,
};

#[derive(Debug, Error)]
#[error("Realm not found")]
struct RealmNotFound;

#[derive(Debug, Error)]
#[error("Invite not found")]
struct InviteNotFound;

#[derive(Debug, Serialize, ToSchema)]
pub struct RealmResponse {
  pub id: String,
  pub slug: String,
  pub realm_permissions: Vec<Permission>,
  pub boards: Vec<BoardSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealmActivity {
  pub boards: Vec<BoardNotifications>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealmInvite {
  pub realm_id: String,
  pub invite_url: String,
  pub invitee_email: String,
  /// Whether the viewer issued this invite.
  pub own: bool,
  pub issued_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealmInvites {
  pub invites: Vec<RealmInvite>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvite {
  pub email: Option<String>,
  pub label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedInvite {
  pub realm_id: String,
  pub invite_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteInfo {
  pub realm_id: String,
  pub realm_slug: String,
  pub invite_status: InviteStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedInvite {
  pub realm_id: String,
  pub realm_slug: String,
}

/// Fails with `forbidden` unless the viewer holds `permission` in the realm.
async fn ensure_realm_permission(
  app: &App,
  realm: &RealmIds,
  viewer: &Viewer,
  permission: Permission,
) -> Result<(), Error> {
  #[derive(Debug, Error)]
  #[error("Missing realm permission")]
  struct MissingPermission;

  let mut conn = app.db_read_prefer_primary().await?;
  let raw = realm.user_permissions(&mut conn, Some(&viewer.firebase_id)).await?;
  if has_permission(&raw, permission) {
    Ok(())
  } else {
    tracing::debug!(realm = %realm.string_id, ?permission, "permission denied");
    Err(Error::from_context(types::Error::Forbidden, MissingPermission))
  }
}

fn email_matches(invitee: &str, viewer: Option<&str>) -> bool {
  viewer.is_some_and(|email| email.trim().eq_ignore_ascii_case(invitee.trim()))
}

#[utoipa::path(
  get,
  path = "/realms/slug/{realm_slug}",
  tag = "realms",
  params(("realm_slug" = String, Path, description = "Slug of the realm")),
  responses(
    (status = 200, description = "The realm with its boards", body = RealmResponse),
    (status = 404, description = "No realm with this slug", body = types::Error),
  ),
  security((), ("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn by_slug(
  app: web::Data<App>,
  realm_slug: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  let mut conn = app.db_read().await?;
  let realm = RealmIds::by_slug(&mut conn, &realm_slug)
    .await?
    .or_not_found(RealmNotFound)?;

  let raw = realm.user_permissions(&mut conn, actor.firebase_id()).await?;
  let boards = DbBoardSummary::for_realm(&mut conn, &realm.string_id, actor.firebase_id()).await?;
  drop(conn);

  Ok(HttpResponse::Ok().json(RealmResponse {
    realm_permissions: extract_permissions(PermissionScope::Realm, &raw),
    boards: process_boards_summary(&realm.string_id, &boards, actor.is_logged_in()),
    id: realm.string_id,
    slug: realm.slug,
  }))
}

#[utoipa::path(
  get,
  path = "/realms/{realm_id}/activity",
  tag = "realms",
  params(("realm_id" = String, Path, description = "String id of the realm")),
  responses(
    (status = 200, description = "Board activity as seen by the viewer", body = RealmActivity),
    (status = 404, description = "No realm with this id", body = types::Error),
  ),
  security((), ("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn activity(
  app: web::Data<App>,
  realm_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  let mut conn = app.db_read().await?;
  let realm = RealmIds::by_string_id(&mut conn, &realm_id)
    .await?
    .or_not_found(RealmNotFound)?;
  let boards = DbBoardActivity::for_realm(&mut conn, &realm.string_id, actor.firebase_id()).await?;

  Ok(HttpResponse::Ok().json(RealmActivity {
    boards: process_boards_notifications(&boards),
  }))
}

#[utoipa::path(
  get,
  path = "/realms/{realm_id}/invites",
  tag = "realms",
  params(("realm_id" = String, Path, description = "String id of the realm")),
  responses(
    (status = 200, description = "Pending invites of the realm", body = RealmInvites),
    (status = 401, description = "Not logged in", body = types::Error),
    (status = 403, description = "Viewer cannot manage invites", body = types::Error),
    (status = 404, description = "No realm with this id", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn list_invites(
  app: web::Data<App>,
  realm_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  let viewer = actor.get_user()?;

  let mut conn = app.db_read_prefer_primary().await?;
  let realm = RealmIds::by_string_id(&mut conn, &realm_id)
    .await?
    .or_not_found(RealmNotFound)?;
  drop(conn);

  ensure_realm_permission(&app, &realm, &viewer, Permission::CreateRealmInvite).await?;

  let mut conn = app.db_read_prefer_primary().await?;
  let user = DbUser::by_firebase_id(&mut conn, &viewer.firebase_id).await?;
  let invites = DbRealmInvite::list_pending(&mut conn, &realm.string_id).await?;

  let invites = invites
    .into_iter()
    .map(|invite| RealmInvite {
      realm_id: realm.string_id.clone(),
      invite_url: app.config.invites.invite_url(&realm.slug, &invite.nonce),
      invitee_email: invite.invitee_email,
      own: user.as_ref().is_some_and(|u| u.id == invite.inviter_id),
      issued_at: invite.created,
      expires_at: invite.expires_at,
      label: invite.label,
    })
    .collect();

  Ok(HttpResponse::Ok().json(RealmInvites { invites }))
}

#[utoipa::path(
  post,
  path = "/realms/{realm_id}/invites",
  tag = "realms",
  params(("realm_id" = String, Path, description = "String id of the realm")),
  request_body = CreateInvite,
  responses(
    (status = 200, description = "Invite created", body = CreatedInvite),
    (status = 400, description = "Missing or invalid e-mail", body = types::Error),
    (status = 401, description = "Not logged in", body = types::Error),
    (status = 403, description = "Viewer cannot create invites", body = types::Error),
    (status = 404, description = "No realm with this id", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor, form))]
pub async fn create_invite(
  app: web::Data<App>,
  realm_id: web::Path<String>,
  actor: Actor,
  form: web::Json<CreateInvite>,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, Error)]
  #[error("Invalid invite request")]
  struct InvalidInvite;

  let viewer = actor.get_user()?;
  let form = form.into_inner();

  let email = form
    .email
    .as_deref()
    .map(str::trim)
    .filter(|email| !email.is_empty())
    .ok_or_else(|| {
      Error::from_context(types::Error::bad_request("email is required"), InvalidInvite)
    })?;

  if !is_valid_email(email) {
    return Err(Error::from_context(
      types::Error::bad_request("email is not a valid e-mail address"),
      InvalidInvite,
    ));
  }

  let mut conn = app.db_read_prefer_primary().await?;
  let realm = RealmIds::by_string_id(&mut conn, &realm_id)
    .await?
    .or_not_found(RealmNotFound)?;
  drop(conn);

  ensure_realm_permission(&app, &realm, &viewer, Permission::CreateRealmInvite).await?;

  #[derive(Debug, Error)]
  #[error("Inviter has no user row")]
  struct InviterNotFound;

  let mut conn = app.db_write().await?;
  let inviter = DbUser::by_firebase_id(&mut conn, &viewer.firebase_id)
    .await?
    .or_not_found(InviterNotFound)?;

  let nonce = generate_nonce();
  DbRealmInvite::create(
    &mut conn,
    &realm.string_id,
    inviter.id,
    &nonce,
    email,
    form.label.as_deref(),
  )
  .await?;

  tracing::info!(realm = %realm.string_id, "created realm invite");
  Ok(HttpResponse::Ok().json(CreatedInvite {
    invite_url: app.config.invites.invite_url(&realm.slug, &nonce),
    realm_id: realm.string_id,
  }))
}

#[utoipa::path(
  get,
  path = "/realms/{realm_id}/invites/{nonce}",
  tag = "realms",
  params(
    ("realm_id" = String, Path, description = "String id of the realm"),
    ("nonce" = String, Path, description = "Secret part of the invite link"),
  ),
  responses(
    (status = 200, description = "Invite status", body = InviteInfo),
    (status = 404, description = "No such invite in this realm", body = types::Error),
  )
)]
#[tracing::instrument(skip(app, path))]
pub async fn get_invite(
  app: web::Data<App>,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse, Error> {
  let (realm_id, nonce) = path.into_inner();

  let mut conn = app.db_read_prefer_primary().await?;
  let realm = RealmIds::by_string_id(&mut conn, &realm_id)
    .await?
    .or_not_found(RealmNotFound)?;
  let invite = InviteDetails::by_nonce(&mut conn, &nonce)
    .await?
    .filter(|invite| invite.realm_string_id == realm.string_id)
    .or_not_found(InviteNotFound)?;

  Ok(HttpResponse::Ok().json(InviteInfo {
    invite_status: invite.status(),
    realm_id: realm.string_id,
    realm_slug: realm.slug,
  }))
}

#[utoipa::path(
  post,
  path = "/realms/{realm_id}/invites/{nonce}",
  tag = "realms",
  params(
    ("realm_id" = String, Path, description = "String id of the realm"),
    ("nonce" = String, Path, description = "Secret part of the invite link"),
  ),
  responses(
    (status = 200, description = "Viewer joined the realm", body = AcceptedInvite),
    (status = 401, description = "Not logged in", body = types::Error),
    (status = 403, description = "Invite expired, used or meant for someone else", body = types::Error),
    (status = 404, description = "No such invite in this realm", body = types::Error),
    (status = 409, description = "Viewer is already a member", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, path, actor))]
pub async fn accept_invite(
  app: web::Data<App>,
  path: web::Path<(String, String)>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  #[derive(Debug, Error)]
  #[error("Invite cannot be accepted")]
  struct UnusableInvite;

  let viewer = actor.get_user()?;
  let (realm_id, nonce) = path.into_inner();

  let mut conn = app.db_write().await?;
  let realm = RealmIds::by_string_id(&mut conn, &realm_id)
    .await?
    .or_not_found(RealmNotFound)?;
  let invite = InviteDetails::by_nonce(&mut conn, &nonce)
    .await?
    .filter(|invite| invite.realm_string_id == realm.string_id)
    .or_not_found(InviteNotFound)?;

  let status = invite.status();
  if status != InviteStatus::Pending {
    tracing::debug!(?status, "rejected invite");
    return Err(Error::from_context(types::Error::Forbidden, UnusableInvite));
  }

  if !email_matches(&invite.invitee_email, viewer.email.as_deref()) {
    tracing::debug!("invite e-mail does not match the viewer");
    return Err(Error::from_context(types::Error::Forbidden, UnusableInvite));
  }

  if realm.has_member(&mut conn, &viewer.firebase_id).await? {
    #[derive(Debug, Error)]
    #[error("User is already a realm member")]
    struct AlreadyMember;
    return Err(Error::from_context(
      types::Error::conflict("already a member of this realm"),
      AlreadyMember,
    ));
  }
  drop(conn);

  let mut tx = app.primary_db.begin().await?;
  InviteDetails::accept(&mut tx, &nonce, &viewer.firebase_id, &realm.string_id).await?;
  tx.commit().await.into_db_error()?;

  tracing::info!(realm = %realm.string_id, "accepted realm invite");
  Ok(HttpResponse::Ok().json(AcceptedInvite {
    realm_id: realm.string_id,
    realm_slug: realm.slug,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn invite_email_comparison() {
    assert!(email_matches("ms.boba@boba.social", Some("Ms.Boba@boba.social")));
    assert!(email_matches("ms.boba@boba.social", Some(" ms.boba@boba.social ")));
    assert!(!email_matches("ms.boba@boba.social", Some("bobatan@boba.social")));
    assert!(!email_matches("ms.boba@boba.social", None));
  }

  #[test]
  fn create_invite_fields_are_optional() {
    let form: CreateInvite = serde_json::from_value(json!({})).unwrap();
    assert!(form.email.is_none());
    assert!(form.label.is_none());
  }

  #[test]
  fn invite_status_is_snake_case() {
    let info = InviteInfo {
      realm_id: "v0".into(),
      realm_slug: "twisted-minds".into(),
      invite_status: InviteStatus::Pending,
    };
    assert_eq!(
      serde_json::to_value(info).unwrap(),
      json!({ "realm_id": "v0", "realm_slug": "twisted-minds", "invite_status": "pending" })
    );
  }
}
