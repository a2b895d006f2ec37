use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::AuthorIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "anonymity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnonymityType {
  Everyone,
  Strangers,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PostOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wide: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbComment {
  pub comment_id: String,
  pub parent_post: String,
  #[sqlx(flatten)]
  pub identity: AuthorIdentity,
  pub content: String,
  pub created: DateTime<Utc>,
  pub anonymity_type: AnonymityType,
  pub is_new: bool,
  pub is_own: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPost {
  pub post_id: String,
  pub parent_thread_id: String,
  pub parent_post_id: Option<String>,
  #[sqlx(flatten)]
  pub identity: AuthorIdentity,
  pub created: DateTime<Utc>,
  pub content: String,
  pub options: Json<PostOptions>,
  pub anonymity_type: AnonymityType,
  pub whisper_tags: Option<Vec<String>>,
  pub index_tags: Option<Vec<String>>,
  pub category_tags: Option<Vec<String>>,
  pub content_warnings: Option<Vec<String>>,
  pub total_comments_amount: i64,
  pub new_comments_amount: i64,
  pub is_new: bool,
  pub is_own: bool,
  /// Filled in by [`DbThread::fetch`](crate::schema::threads) after the
  /// comment rows of the thread are loaded.
  #[sqlx(skip)]
  pub comments: Option<Vec<DbComment>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbThread {
  pub thread_id: String,
  pub thread_direct_threads_amount: i64,
  pub thread_new_posts_amount: i64,
  pub thread_new_comments_amount: i64,
  pub thread_total_posts_amount: i64,
  pub thread_total_comments_amount: i64,
  pub thread_last_activity: DateTime<Utc>,
  pub muted: bool,
  pub hidden: bool,
  #[sqlx(skip)]
  pub posts: Vec<DbPost>,
}
