use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RealmIds {
  pub string_id: String,
  pub slug: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRealmInvite {
  pub nonce: String,
  pub inviter_id: i64,
  pub invitee_email: String,
  pub created: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  pub label: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InviteDetails {
  pub realm_string_id: String,
  pub inviter: i64,
  pub invitee_email: String,
  pub expired: bool,
  pub used: bool,
}
