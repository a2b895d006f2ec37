use actix_web::web;

pub mod docs;
pub mod realms;
pub mod tags;
pub mod threads;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg.route("/open-api.json", web::get().to(docs::open_api))
    .service(
      web::scope("/threads/{thread_id}")
        .route("", web::get().to(threads::get_thread))
        .route("/mute", web::post().to(threads::mute))
        .route("/unmute", web::post().to(threads::unmute))
        .route("/hide", web::post().to(threads::hide))
        .route("/unhide", web::post().to(threads::unhide))
        .route("/visit", web::post().to(threads::visit)),
    )
    .route("/tags/search", web::get().to(tags::search))
    .service(
      web::scope("/users/@me")
        .route("", web::get().to(users::me))
        .route("/settings", web::get().to(users::settings))
        .route("/settings", web::patch().to(users::update_settings))
        .route("/notifications/dismiss", web::post().to(users::dismiss_notifications)),
    )
    .service(
      web::scope("/realms")
        .route("/slug/{realm_slug}", web::get().to(realms::by_slug))
        .route("/{realm_id}/activity", web::get().to(realms::activity))
        .route("/{realm_id}/invites", web::get().to(realms::list_invites))
        .route("/{realm_id}/invites", web::post().to(realms::create_invite))
        .route("/{realm_id}/invites/{nonce}", web::get().to(realms::get_invite))
        .route("/{realm_id}/invites/{nonce}", web::post().to(realms::accept_invite)),
    );
}
