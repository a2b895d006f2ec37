use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::controllers::{docs, realms, tags, threads, users};

/// `OpenAPI` documentation of every route served by [`super::controllers::configure`].
#[derive(OpenApi)]
#[openapi(
  info(
    title = "Boba backend",
    description = "Threads, tag search, realms and invites of a boba forum"
  ),
  paths(
    docs::open_api,
    threads::get_thread,
    threads::mute,
    threads::unmute,
    threads::hide,
    threads::unhide,
    threads::visit,
    tags::search,
    users::me,
    users::settings,
    users::update_settings,
    users::dismiss_notifications,
    realms::by_slug,
    realms::activity,
    realms::list_invites,
    realms::create_invite,
    realms::get_invite,
    realms::accept_invite,
  ),
  components(
    schemas(
      crate::types::Error,
      crate::types::Permission,
      crate::projection::SecretIdentity,
      crate::projection::UserIdentity,
      crate::projection::ProjectedIdentity,
      crate::projection::PostTags,
      crate::projection::ServerComment,
      crate::projection::ServerPost,
      crate::projection::ServerThread,
      crate::projection::SearchTags,
      crate::projection::ServerTaggedPost,
      crate::projection::ServerPostWithTags,
      crate::projection::BoardSummary,
      crate::projection::BoardNotifications,
      crate::models::UserSetting,
      crate::schema::invites::InviteStatus,
      users::CurrentUser,
      users::UpdateSetting,
      realms::RealmResponse,
      realms::RealmActivity,
      realms::RealmInvite,
      realms::RealmInvites,
      realms::CreateInvite,
      realms::CreatedInvite,
      realms::InviteInfo,
      realms::AcceptedInvite,
    )
  ),
  tags(
    (name = "threads", description = "Reading threads and per-viewer thread state"),
    (name = "tags", description = "Tag search"),
    (name = "users", description = "The logged in user"),
    (name = "realms", description = "Realms, their boards and invites"),
    (name = "docs", description = "API documentation"),
  ),
  modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
  fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
      "bearer",
      SecurityScheme::Http(
        HttpBuilder::new()
          .scheme(HttpAuthScheme::Bearer)
          .bearer_format("JWT")
          .build(),
      ),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn documents_every_route() {
    let doc = ApiDoc::openapi();
    for path in [
      "/open-api.json",
      "/threads/{thread_id}",
      "/threads/{thread_id}/mute",
      "/threads/{thread_id}/visit",
      "/tags/search",
      "/users/@me",
      "/users/@me/settings",
      "/users/@me/notifications/dismiss",
      "/realms/slug/{realm_slug}",
      "/realms/{realm_id}/activity",
      "/realms/{realm_id}/invites",
      "/realms/{realm_id}/invites/{nonce}",
    ] {
      assert!(doc.paths.paths.contains_key(path), "{path} is not documented");
    }
  }

  #[test]
  fn version_defaults_to_the_package() {
    assert_eq!(ApiDoc::openapi().info.version, env!("CARGO_PKG_VERSION"));
  }

  #[test]
  fn has_bearer_scheme() {
    let doc = ApiDoc::openapi();
    let components = doc.components.unwrap();
    assert!(components.security_schemes.contains_key("bearer"));
    assert!(components.schemas.contains_key("ServerThread"));
  }
}
