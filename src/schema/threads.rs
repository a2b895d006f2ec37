use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{identity_columns, identity_joins, is_new, VIEWER_CTE};
use crate::database::{Connection, ErrorExt, Result};
use crate::models::{DbComment, DbPost, DbThread};

/// CTEs shared by every thread query. `$1` is the viewer's identity
/// provider id and `$2` the thread's string id.
static THREAD_CTES: Lazy<String> = Lazy::new(|| {
  format!(
    r#"
    WITH {VIEWER_CTE},
    thread AS (SELECT id, string_id FROM threads WHERE string_id::text = $2),
    last_visit AS (
      SELECT MAX(last_visit_time) AS at
      FROM user_thread_last_visits, thread, viewer
      WHERE user_thread_last_visits.thread_id = thread.id
        AND user_thread_last_visits.user_id = viewer.id
    ),
    dismissed AS (
      SELECT dismiss_request_time AS at
      FROM dismiss_notifications_requests, viewer
      WHERE dismiss_notifications_requests.user_id = viewer.id
    )"#
  )
});

const VIEWER_STATE_JOINS: &str = r#"
    LEFT JOIN viewer ON TRUE
    LEFT JOIN last_visit ON TRUE
    LEFT JOIN dismissed ON TRUE"#;

static GET_THREAD_SUMMARY: Lazy<String> = Lazy::new(|| {
  format!(
    r#"{ctes}
    SELECT
      thread.string_id::text AS thread_id,
      COUNT(DISTINCT posts.id) FILTER (WHERE posts.parent_post = root.id) AS thread_direct_threads_amount,
      COUNT(DISTINCT posts.id) FILTER (WHERE {new_post}) AS thread_new_posts_amount,
      COUNT(DISTINCT comments.id) FILTER (WHERE {new_comment}) AS thread_new_comments_amount,
      COUNT(DISTINCT posts.id) AS thread_total_posts_amount,
      COUNT(DISTINCT comments.id) AS thread_total_comments_amount,
      GREATEST(MAX(posts.created), MAX(comments.created)) AS thread_last_activity,
      EXISTS (
        SELECT 1 FROM user_muted_threads
        WHERE user_muted_threads.user_id = viewer.id AND user_muted_threads.thread_id = thread.id
      ) AS muted,
      EXISTS (
        SELECT 1 FROM user_hidden_threads
        WHERE user_hidden_threads.user_id = viewer.id AND user_hidden_threads.thread_id = thread.id
      ) AS hidden
    FROM thread
    JOIN posts ON posts.parent_thread = thread.id
    JOIN posts AS root ON root.parent_thread = thread.id AND root.parent_post IS NULL
    LEFT JOIN comments ON comments.parent_post = posts.id
    {viewer_joins}
    GROUP BY thread.id, thread.string_id, viewer.id, last_visit.at, dismissed.at"#,
    ctes = *THREAD_CTES,
    new_post = is_new("posts.created", "posts.author"),
    new_comment = is_new("comments.created", "comments.author"),
    viewer_joins = VIEWER_STATE_JOINS,
  )
});

static GET_THREAD_POSTS: Lazy<String> = Lazy::new(|| {
  format!(
    r#"{ctes}
    SELECT
      posts.string_id::text AS post_id,
      thread.string_id::text AS parent_thread_id,
      parent.string_id::text AS parent_post_id,
      {identity},
      posts.created,
      posts.content,
      COALESCE(posts.options, '{{}}'::jsonb) AS options,
      posts.anonymity_type,
      CASE WHEN posts.author = viewer.id THEN posts.whisper_tags END AS whisper_tags,
      (SELECT ARRAY_AGG(tags.tag ORDER BY tags.tag)
        FROM post_tags JOIN tags ON tags.id = post_tags.tag_id
        WHERE post_tags.post_id = posts.id) AS index_tags,
      (SELECT ARRAY_AGG(categories.category ORDER BY categories.category)
        FROM post_categories JOIN categories ON categories.id = post_categories.category_id
        WHERE post_categories.post_id = posts.id) AS category_tags,
      (SELECT ARRAY_AGG(content_warnings.warning ORDER BY content_warnings.warning)
        FROM post_warnings JOIN content_warnings ON content_warnings.id = post_warnings.warning_id
        WHERE post_warnings.post_id = posts.id) AS content_warnings,
      (SELECT COUNT(*) FROM comments WHERE comments.parent_post = posts.id) AS total_comments_amount,
      (SELECT COUNT(*) FROM comments
        WHERE comments.parent_post = posts.id AND {new_comment}) AS new_comments_amount,
      {new_post} AS is_new,
      COALESCE(posts.author = viewer.id, FALSE) AS is_own
    FROM thread
    JOIN posts ON posts.parent_thread = thread.id
    LEFT JOIN posts AS parent ON parent.id = posts.parent_post
    {viewer_joins}
    {identity_joins}
    ORDER BY posts.created, posts.id"#,
    ctes = *THREAD_CTES,
    identity = identity_columns("", ""),
    identity_joins = identity_joins("posts", ""),
    new_post = is_new("posts.created", "posts.author"),
    new_comment = is_new("comments.created", "comments.author"),
    viewer_joins = VIEWER_STATE_JOINS,
  )
});

static GET_THREAD_COMMENTS: Lazy<String> = Lazy::new(|| {
  format!(
    r#"{ctes}
    SELECT
      comments.string_id::text AS comment_id,
      posts.string_id::text AS parent_post,
      {identity},
      comments.content,
      comments.created,
      comments.anonymity_type,
      {new_comment} AS is_new,
      COALESCE(comments.author = viewer.id, FALSE) AS is_own
    FROM thread
    JOIN posts ON posts.parent_thread = thread.id
    JOIN comments ON comments.parent_post = posts.id
    {viewer_joins}
    {identity_joins}
    ORDER BY comments.created, comments.id"#,
    ctes = *THREAD_CTES,
    identity = identity_columns("", ""),
    identity_joins = identity_joins("comments", ""),
    new_comment = is_new("comments.created", "comments.author"),
    viewer_joins = VIEWER_STATE_JOINS,
  )
});

impl DbThread {
  /// Loads a whole thread as seen by `firebase_id`, with every post
  /// and its comments.
  ///
  /// Returns `None` when no thread has that id.
  #[tracing::instrument(skip(conn, firebase_id), name = "db.threads.fetch")]
  pub async fn fetch(
    conn: &mut Connection,
    thread_id: &str,
    firebase_id: Option<&str>,
  ) -> Result<Option<Self>> {
    let summary = sqlx::query_as::<_, Self>(&GET_THREAD_SUMMARY)
      .bind(firebase_id)
      .bind(thread_id)
      .fetch_optional(&mut *conn)
      .await
      .into_db_error()?;

    let Some(mut thread) = summary else {
      return Ok(None);
    };

    let posts = sqlx::query_as::<_, DbPost>(&GET_THREAD_POSTS)
      .bind(firebase_id)
      .bind(thread_id)
      .fetch_all(&mut *conn)
      .await
      .into_db_error()?;

    let comments = sqlx::query_as::<_, DbComment>(&GET_THREAD_COMMENTS)
      .bind(firebase_id)
      .bind(thread_id)
      .fetch_all(&mut *conn)
      .await
      .into_db_error()?;

    thread.posts = attach_comments(posts, comments);
    Ok(Some(thread))
  }
}

/// Hands every comment to the post it replies to, keeping the order
/// comments were loaded in. Posts without comments get `None`.
fn attach_comments(mut posts: Vec<DbPost>, comments: Vec<DbComment>) -> Vec<DbPost> {
  let mut by_post: HashMap<String, Vec<DbComment>> = HashMap::new();
  for comment in comments {
    by_post
      .entry(comment.parent_post.clone())
      .or_default()
      .push(comment);
  }

  for post in &mut posts {
    post.comments = by_post.remove(&post.post_id);
  }
  posts
}

/// Per-viewer thread state toggled from the thread page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAction {
  Mute,
  Unmute,
  Hide,
  Unhide,
  Visit,
}

impl ThreadAction {
  fn query(self) -> &'static str {
    match self {
      Self::Mute => {
        r#"
        INSERT INTO user_muted_threads(user_id, thread_id)
        SELECT users.id, threads.id FROM users, threads
        WHERE users.firebase_id = $1 AND threads.string_id::text = $2
        ON CONFLICT DO NOTHING"#
      }
      Self::Unmute => {
        r#"
        DELETE FROM user_muted_threads
        USING users, threads
        WHERE user_muted_threads.user_id = users.id
          AND user_muted_threads.thread_id = threads.id
          AND users.firebase_id = $1 AND threads.string_id::text = $2"#
      }
      Self::Hide => {
        r#"
        INSERT INTO user_hidden_threads(user_id, thread_id)
        SELECT users.id, threads.id FROM users, threads
        WHERE users.firebase_id = $1 AND threads.string_id::text = $2
        ON CONFLICT DO NOTHING"#
      }
      Self::Unhide => {
        r#"
        DELETE FROM user_hidden_threads
        USING users, threads
        WHERE user_hidden_threads.user_id = users.id
          AND user_hidden_threads.thread_id = threads.id
          AND users.firebase_id = $1 AND threads.string_id::text = $2"#
      }
      Self::Visit => {
        r#"
        INSERT INTO user_thread_last_visits(user_id, thread_id)
        SELECT users.id, threads.id FROM users, threads
        WHERE users.firebase_id = $1 AND threads.string_id::text = $2
        ON CONFLICT(user_id, thread_id) DO UPDATE
          SET last_visit_time = DEFAULT"#
      }
    }
  }

  /// Applies the action for the viewer. Unknown threads are silently
  /// ignored, like toggling a flag twice.
  #[tracing::instrument(skip(conn, firebase_id), name = "db.threads.apply_action")]
  pub async fn apply(
    self,
    conn: &mut Connection,
    firebase_id: &str,
    thread_id: &str,
  ) -> Result<()> {
    sqlx::query(self.query())
      .bind(firebase_id)
      .bind(thread_id)
      .execute(conn)
      .await
      .into_db_error()?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{AnonymityType, PostOptions};
  use crate::projection::identity::tests::identity;
  use crate::projection::post::tests::created;
  use sqlx::types::Json;

  fn post(id: &str) -> DbPost {
    DbPost {
      post_id: id.into(),
      parent_thread_id: "thread".into(),
      parent_post_id: None,
      identity: identity(false, false),
      created: created(),
      content: String::new(),
      options: Json(PostOptions::default()),
      anonymity_type: AnonymityType::Everyone,
      whisper_tags: None,
      index_tags: None,
      category_tags: None,
      content_warnings: None,
      total_comments_amount: 0,
      new_comments_amount: 0,
      is_new: false,
      is_own: false,
      comments: None,
    }
  }

  fn comment(id: &str, parent: &str) -> DbComment {
    DbComment {
      comment_id: id.into(),
      parent_post: parent.into(),
      identity: identity(false, false),
      content: String::new(),
      created: created(),
      anonymity_type: AnonymityType::Strangers,
      is_new: false,
      is_own: false,
    }
  }

  #[test]
  fn comments_go_to_their_parent_post() {
    let posts = attach_comments(
      vec![post("a"), post("b"), post("c")],
      vec![comment("1", "c"), comment("2", "a"), comment("3", "c")],
    );

    let ids = |post: &DbPost| {
      post.comments
        .as_ref()
        .map(|v| v.iter().map(|c| c.comment_id.clone()).collect::<Vec<_>>())
    };
    assert_eq!(ids(&posts[0]), Some(vec!["2".to_string()]));
    assert_eq!(ids(&posts[1]), None);
    assert_eq!(ids(&posts[2]), Some(vec!["1".to_string(), "3".to_string()]));
  }

  #[test]
  fn new_rows_exclude_the_viewer() {
    let sql = is_new("posts.created", "posts.author");
    assert!(sql.contains("posts.author IS DISTINCT FROM viewer.id"));
    assert!(sql.contains("viewer.id IS NOT NULL"));
  }

  #[test]
  fn queries_bind_viewer_first() {
    for sql in [&*GET_THREAD_SUMMARY, &*GET_THREAD_POSTS, &*GET_THREAD_COMMENTS] {
      assert!(sql.contains("firebase_id = $1"));
      assert!(sql.contains("string_id::text = $2"));
    }
  }
}
