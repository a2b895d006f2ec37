use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::identity::{merge_identity, ProjectedIdentity};
use crate::models::{DbPostWithTags, DbTaggedPost};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SearchTags {
  pub index_tags: Vec<String>,
  pub category_tags: Vec<String>,
  pub content_warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerTaggedPost {
  pub post_id: String,
  pub parent_thread_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_post_id: Option<String>,
  #[serde(flatten)]
  pub identity: ProjectedIdentity,
  pub created: DateTime<Utc>,
  pub content: String,
  pub tags: SearchTags,
  pub child_post_count: i64,
  pub child_comment_count: i64,
  pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerPostWithTags {
  pub post: ServerTaggedPost,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_post_in_thread: Option<ServerTaggedPost>,
}

pub fn make_tagged_post(post: &DbTaggedPost) -> ServerTaggedPost {
  ServerTaggedPost {
    post_id: post.post_id.clone(),
    parent_thread_id: post.parent_thread_id.clone(),
    parent_post_id: post.parent_post_id.clone(),
    identity: merge_identity(&post.identity),
    created: post.created,
    content: post.content.clone(),
    tags: SearchTags {
      index_tags: post.index_tags.clone(),
      category_tags: post.category_tags.clone(),
      content_warnings: post.content_warnings.clone(),
    },
    child_post_count: post.child_post_count,
    child_comment_count: post.child_comment_count,
    is_new: post.is_new,
  }
}

pub fn make_search_result(row: &DbPostWithTags) -> ServerPostWithTags {
  ServerPostWithTags {
    post: make_tagged_post(&row.post),
    first_post_in_thread: row.first_post_in_thread.as_ref().map(make_tagged_post),
  }
}
