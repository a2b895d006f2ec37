use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardRestriction {
  LockAccess,
  Delist,
}

impl BoardRestriction {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      BoardRestriction::LockAccess => "lock_access",
      BoardRestriction::Delist => "delist",
    }
  }

  pub fn is_in<S: AsRef<str>>(self, restrictions: &[S]) -> bool {
    restrictions.iter().any(|v| v.as_ref() == self.as_str())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSettings {
  #[serde(default)]
  pub accent_color: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbBoardSummary {
  pub string_id: String,
  pub slug: String,
  pub tagline: String,
  pub avatar_reference_id: Option<String>,
  pub settings: Json<BoardSettings>,
  pub logged_out_restrictions: Vec<String>,
  pub logged_in_base_restrictions: Vec<String>,
  pub muted: bool,
  pub pinned_order: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbBoardActivity {
  pub string_id: String,
  pub has_updates: bool,
  pub last_activity: Option<DateTime<Utc>>,
  pub last_activity_from_others: Option<DateTime<Utc>>,
  pub last_visit: Option<DateTime<Utc>>,
}
