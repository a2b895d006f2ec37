use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::identity::{merge_identity, ProjectedIdentity};
use crate::models::{AnonymityType, DbComment, DbPost, DbThread, PostOptions};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerComment {
  pub comment_id: String,
  pub parent_post: String,
  #[serde(flatten)]
  pub identity: ProjectedIdentity,
  pub content: String,
  pub created: DateTime<Utc>,
  pub anonymity_type: AnonymityType,
  pub is_new: bool,
  pub is_own: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PostTags {
  pub whisper_tags: Vec<String>,
  pub index_tags: Vec<String>,
  pub category_tags: Vec<String>,
  pub content_warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerPost {
  pub post_id: String,
  pub parent_thread_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_post_id: Option<String>,
  #[serde(flatten)]
  pub identity: ProjectedIdentity,
  pub created: DateTime<Utc>,
  pub content: String,
  pub options: PostOptions,
  pub anonymity_type: AnonymityType,
  pub tags: PostTags,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comments: Option<Vec<ServerComment>>,
  pub total_comments_amount: i64,
  pub new_comments_amount: i64,
  pub is_new: bool,
  pub is_own: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerThread {
  pub thread_id: String,
  pub posts: Vec<ServerPost>,
  pub thread_direct_threads_amount: i64,
  pub thread_new_posts_amount: i64,
  pub thread_new_comments_amount: i64,
  pub thread_total_comments_amount: i64,
  pub thread_total_posts_amount: i64,
  pub thread_last_activity: DateTime<Utc>,
  pub muted: bool,
  pub hidden: bool,
}

pub fn make_thread(thread: &DbThread) -> ServerThread {
  ServerThread {
    thread_id: thread.thread_id.clone(),
    posts: thread.posts.iter().map(make_post).collect(),
    thread_direct_threads_amount: thread.thread_direct_threads_amount,
    thread_new_posts_amount: thread.thread_new_posts_amount,
    thread_new_comments_amount: thread.thread_new_comments_amount,
    thread_total_comments_amount: thread.thread_total_comments_amount,
    thread_total_posts_amount: thread.thread_total_posts_amount,
    thread_last_activity: thread.thread_last_activity,
    muted: thread.muted,
    hidden: thread.hidden,
  }
}

pub fn make_post(post: &DbPost) -> ServerPost {
  let tags = PostTags {
    whisper_tags: post.whisper_tags.clone().unwrap_or_default(),
    index_tags: post.index_tags.clone().unwrap_or_default(),
    category_tags: post.category_tags.clone().unwrap_or_default(),
    content_warnings: post.content_warnings.clone().unwrap_or_default(),
  };

  ServerPost {
    post_id: post.post_id.clone(),
    parent_thread_id: post.parent_thread_id.clone(),
    parent_post_id: post.parent_post_id.clone(),
    identity: merge_identity(&post.identity),
    created: post.created,
    content: post.content.clone(),
    options: post.options.0.clone(),
    anonymity_type: post.anonymity_type,
    tags,
    comments: post
      .comments
      .as_ref()
      .map(|comments| comments.iter().map(make_comment).collect()),
    total_comments_amount: post.total_comments_amount,
    new_comments_amount: post.new_comments_amount,
    is_new: post.is_new,
    is_own: post.is_own,
  }
}

pub fn make_comment(comment: &DbComment) -> ServerComment {
  ServerComment {
    comment_id: comment.comment_id.clone(),
    parent_post: comment.parent_post.clone(),
    identity: merge_identity(&comment.identity),
    content: comment.content.clone(),
    created: comment.created,
    anonymity_type: comment.anonymity_type,
    is_new: comment.is_new,
    is_own: comment.is_own,
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::projection::identity::tests::identity;
  use chrono::TimeZone;
  use sqlx::types::Json;

  pub(crate) fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 4, 30, 3, 23, 0).unwrap()
  }

  pub(crate) fn comment(id: &str, friend: bool, self_: bool) -> DbComment {
    DbComment {
      comment_id: id.into(),
      parent_post: "3db477e0-57ed-491d-ba11-b3a0110b59b0".into(),
      identity: identity(friend, self_),
      content: "[{\"insert\":\"Favorite character to maim?\"}]".into(),
      created: created(),
      anonymity_type: AnonymityType::Strangers,
      is_new: false,
      is_own: self_,
    }
  }

  pub(crate) fn post(friend: bool, self_: bool, comments: Option<Vec<DbComment>>) -> DbPost {
    DbPost {
      post_id: "3db477e0-57ed-491d-ba11-b3a0110b59b0".into(),
      parent_thread_id: "29d1b2da-3289-454a-9089-2ed47db4967b".into(),
      parent_post_id: None,
      identity: identity(friend, self_),
      created: created(),
      content: "[{\"insert\":\"Remember to be excellent to each other.\"}]".into(),
      options: Json(PostOptions { wide: Some(true) }),
      anonymity_type: AnonymityType::Everyone,
      whisper_tags: Some(vec!["an announcement".into()]),
      index_tags: Some(vec!["evil".into(), "bobapost".into()]),
      category_tags: None,
      content_warnings: Some(vec!["spoilers".into()]),
      total_comments_amount: comments.as_ref().map_or(0, |c| c.len() as i64),
      new_comments_amount: 0,
      is_new: true,
      is_own: self_,
      comments,
    }
  }

  pub(crate) fn thread(posts: Vec<DbPost>) -> DbThread {
    DbThread {
      thread_id: "29d1b2da-3289-454a-9089-2ed47db4967b".into(),
      thread_direct_threads_amount: 0,
      thread_new_posts_amount: 1,
      thread_new_comments_amount: 0,
      thread_total_posts_amount: posts.len() as i64,
      thread_total_comments_amount: 2,
      thread_last_activity: created(),
      muted: false,
      hidden: true,
      posts,
    }
  }

  #[test]
  fn regroups_tags() {
    let projected = make_post(&post(false, false, None));
    assert_eq!(
      projected.tags,
      PostTags {
        whisper_tags: vec!["an announcement".into()],
        index_tags: vec!["evil".into(), "bobapost".into()],
        category_tags: vec![],
        content_warnings: vec!["spoilers".into()],
      }
    );

    let value = serde_json::to_value(&projected).unwrap();
    let object = value.as_object().unwrap();
    for flat in ["whisper_tags", "index_tags", "category_tags", "content_warnings"] {
      assert!(!object.contains_key(flat), "{flat} was not regrouped");
    }
    assert_eq!(value["tags"]["category_tags"], serde_json::json!([]));
  }

  #[test]
  fn stranger_post_has_no_user_identity_key() {
    let value = serde_json::to_value(make_post(&post(false, false, None))).unwrap();
    let object = value.as_object().unwrap();

    assert!(!object.contains_key("user_identity"));
    assert!(object.contains_key("secret_identity"));
    for raw in ["author", "user_id", "username", "user_avatar"] {
      assert!(!object.contains_key(raw), "{raw} survived the projection");
    }
    // a root post has no parent and no comment list
    assert!(!object.contains_key("parent_post_id"));
    assert!(!object.contains_key("comments"));
  }

  #[test]
  fn own_post_carries_both_identities() {
    let projected = make_post(&post(false, true, None));
    assert_eq!(projected.identity.secret_identity.name, "Old Time-y Anon");
    assert_eq!(
      projected.identity.user_identity.map(|v| v.name).as_deref(),
      Some("oncest5evah")
    );
  }

  #[test]
  fn projects_comments_independently() {
    let comments = vec![comment("c1", false, false), comment("c2", true, false)];
    let projected = make_post(&post(false, false, Some(comments)));
    let comments = projected.comments.unwrap();

    assert_eq!(comments.len(), 2);
    assert!(comments[0].identity.user_identity.is_none());
    assert!(comments[1].identity.user_identity.is_some());
  }

  #[test]
  fn thread_keeps_aggregates() {
    let source = thread(vec![post(false, false, None), post(true, false, None)]);
    let projected = make_thread(&source);

    assert_eq!(projected.posts.len(), 2);
    assert_eq!(projected.thread_total_posts_amount, 2);
    assert_eq!(projected.thread_new_posts_amount, 1);
    assert!(projected.hidden);
    assert!(!projected.muted);

    let value = serde_json::to_value(&projected).unwrap();
    assert_eq!(value["thread_last_activity"], "2020-04-30T03:23:00Z");
  }

  #[test]
  fn does_not_touch_the_source_rows() {
    let source = post(false, false, Some(vec![comment("c1", false, false)]));
    let before = format!("{source:?}");
    let _ = make_post(&source);
    assert_eq!(before, format!("{source:?}"));
  }
}
