use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Deserialize, Serialize)]
pub struct DbUser {
  pub id: i64,
  pub firebase_id: String,
  pub username: String,
  pub avatar_reference_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct UserSetting {
  pub name: String,
  pub value: String,
  #[sqlx(rename = "type")]
  #[serde(rename = "type")]
  pub kind: String,
}
