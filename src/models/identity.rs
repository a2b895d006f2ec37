use sqlx::FromRow;

/// Author columns shared by every post and comment row.
///
/// `friend` and `self_` are computed against the viewer that requested
/// the row and decide whether the real identity may be shown at all.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AuthorIdentity {
  pub author: i64,
  pub username: String,
  pub user_avatar: String,
  pub secret_identity_name: String,
  pub secret_identity_avatar: String,
  pub secret_identity_color: Option<String>,
  pub accessory_avatar: Option<String>,
  pub friend: bool,
  #[sqlx(rename = "self")]
  pub self_: bool,
}

impl AuthorIdentity {
  /// Whether the viewer is allowed to see the author's real identity.
  #[must_use]
  pub fn is_visible_to_viewer(&self) -> bool {
    self.friend || self.self_
  }
}
