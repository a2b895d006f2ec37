use actix_web::{web, HttpResponse};
use thiserror::Error;

use crate::{
  http::{error::OptionExt, Actor, Error},
  models::DbThread,
  projection::{assert_no_leakage, make_thread, ServerThread},
  schema::threads::ThreadAction,
  types, App,
};

#[derive(Debug, Error)]
#[error("Thread not found")]
struct ThreadNotFound;

#[utoipa::path(
  get,
  path = "/threads/{thread_id}",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 200, description = "The thread as seen by the viewer", body = ServerThread),
    (status = 404, description = "No thread with this id", body = types::Error),
  ),
  security((), ("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn get_thread(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  let mut conn = app.db_read().await?;
  let thread = DbThread::fetch(&mut conn, &thread_id, actor.firebase_id())
    .await?
    .or_not_found(ThreadNotFound)?;
  drop(conn);

  let thread = make_thread(&thread);
  assert_no_leakage(&thread)?;

  Ok(HttpResponse::Ok().json(thread))
}

async fn apply(
  app: &App,
  thread_id: &str,
  actor: Actor,
  action: ThreadAction,
) -> Result<HttpResponse, Error> {
  let viewer = actor.get_user()?;

  let mut conn = app.db_write().await?;
  action.apply(&mut conn, &viewer.firebase_id, thread_id).await?;

  tracing::info!(?action, "updated thread state");
  Ok(HttpResponse::NoContent().finish())
}

/// Stops updates of the thread from showing up.
#[utoipa::path(
  post,
  path = "/threads/{thread_id}/mute",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 204, description = "Done"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn mute(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  apply(&app, &thread_id, actor, ThreadAction::Mute).await
}

/// Undoes `mute`.
#[utoipa::path(
  post,
  path = "/threads/{thread_id}/unmute",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 204, description = "Done"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn unmute(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  apply(&app, &thread_id, actor, ThreadAction::Unmute).await
}

/// Hides the thread from board feeds.
#[utoipa::path(
  post,
  path = "/threads/{thread_id}/hide",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 204, description = "Done"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn hide(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  apply(&app, &thread_id, actor, ThreadAction::Hide).await
}

/// Undoes `hide`.
#[utoipa::path(
  post,
  path = "/threads/{thread_id}/unhide",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 204, description = "Done"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn unhide(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  apply(&app, &thread_id, actor, ThreadAction::Unhide).await
}

/// Marks everything in the thread as seen.
#[utoipa::path(
  post,
  path = "/threads/{thread_id}/visit",
  tag = "threads",
  params(("thread_id" = String, Path, description = "String id of the thread")),
  responses(
    (status = 204, description = "Done"),
    (status = 401, description = "Not logged in", body = types::Error),
  ),
  security(("bearer" = []))
)]
#[tracing::instrument(skip(app, actor))]
pub async fn visit(
  app: web::Data<App>,
  thread_id: web::Path<String>,
  actor: Actor,
) -> Result<HttpResponse, Error> {
  apply(&app, &thread_id, actor, ThreadAction::Visit).await
}
