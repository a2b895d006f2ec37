use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::AuthorIdentity;

/// One post as aggregated by the tag search query.
#[derive(Debug, Clone)]
pub struct DbTaggedPost {
  pub post_id: String,
  pub parent_thread_id: String,
  pub parent_post_id: Option<String>,
  pub identity: AuthorIdentity,
  pub created: DateTime<Utc>,
  pub content: String,
  pub index_tags: Vec<String>,
  pub category_tags: Vec<String>,
  pub content_warnings: Vec<String>,
  pub child_post_count: i64,
  pub child_comment_count: i64,
  pub is_new: bool,
}

/// A search hit together with the first post of its thread, so the
/// thread context can be rendered without another round trip.
///
/// `first_post_in_thread` is `None` when the hit is itself the first post.
#[derive(Debug, Clone)]
pub struct DbPostWithTags {
  pub post: DbTaggedPost,
  pub first_post_in_thread: Option<DbTaggedPost>,
}

impl DbTaggedPost {
  fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
    let column = |name: &str| format!("{prefix}.{name}");
    Ok(Self {
      post_id: row.try_get(column("post_id").as_str())?,
      parent_thread_id: row.try_get(column("parent_thread_id").as_str())?,
      parent_post_id: row.try_get(column("parent_post_id").as_str())?,
      identity: AuthorIdentity {
        author: row.try_get(column("author").as_str())?,
        username: row.try_get(column("username").as_str())?,
        user_avatar: row.try_get(column("user_avatar").as_str())?,
        secret_identity_name: row.try_get(column("secret_identity_name").as_str())?,
        secret_identity_avatar: row.try_get(column("secret_identity_avatar").as_str())?,
        secret_identity_color: row.try_get(column("secret_identity_color").as_str())?,
        accessory_avatar: row.try_get(column("accessory_avatar").as_str())?,
        friend: row.try_get(column("friend").as_str())?,
        self_: row.try_get(column("self").as_str())?,
      },
      created: row.try_get(column("created").as_str())?,
      content: row.try_get(column("content").as_str())?,
      index_tags: row.try_get(column("index_tags").as_str())?,
      category_tags: row.try_get(column("category_tags").as_str())?,
      content_warnings: row.try_get(column("content_warnings").as_str())?,
      child_post_count: row.try_get(column("child_post_count").as_str())?,
      child_comment_count: row.try_get(column("child_comment_count").as_str())?,
      is_new: row.try_get(column("is_new").as_str())?,
    })
  }
}

impl<'r> FromRow<'r, PgRow> for DbPostWithTags {
  fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
    let post = DbTaggedPost::from_prefixed_row(row, "p")?;
    let first_post_in_thread = row
      .try_get::<Option<String>, _>("fp.post_id")?
      .map(|_| DbTaggedPost::from_prefixed_row(row, "fp"))
      .transpose()?;

    Ok(Self {
      post,
      first_post_in_thread,
    })
  }
}
