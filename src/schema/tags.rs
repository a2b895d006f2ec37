use error_stack::Report;
use once_cell::sync::Lazy;
use thiserror::Error;

use super::{identity_columns, identity_group_keys, identity_joins, is_new, VIEWER_CTE};
use crate::database::{Connection, ErrorExt, Result};
use crate::models::DbPostWithTags;

#[derive(Debug, Error)]
#[error("Tag search requires at least one tag to include")]
pub struct EmptyIncludeTags;

/// Which posts a tag search returns.
///
/// A post matches when its index tags contain every included tag and
/// none of the excluded ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
  include: Vec<String>,
  exclude: Vec<String>,
}

impl TagFilter {
  pub fn new(include: Vec<String>, exclude: Vec<String>) -> std::result::Result<Self, Report<EmptyIncludeTags>> {
    if include.is_empty() {
      return Err(Report::new(EmptyIncludeTags));
    }
    Ok(Self { include, exclude })
  }

  /// Reads repeated `tags` and `exclude` keys off a query string, so
  /// `?tags=a&tags=b&exclude=c` includes `a` and `b` and excludes `c`.
  pub fn from_query(query: &str) -> std::result::Result<Self, Report<EmptyIncludeTags>> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
      match key.as_ref() {
        "tags" => include.push(value.into_owned()),
        "exclude" => exclude.push(value.into_owned()),
        _ => {}
      }
    }
    Self::new(include, exclude)
  }

  #[must_use]
  pub fn include(&self) -> &[String] {
    &self.include
  }

  #[must_use]
  pub fn exclude(&self) -> &[String] {
    &self.exclude
  }

  /// Same predicate as the one the search query applies in SQL.
  pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
    let has = |tag: &String| tags.iter().any(|t| t.as_ref() == tag);
    self.include.iter().all(has) && !self.exclude.iter().any(has)
  }
}

/// Every join below fans out per tag, warning, child post and comment,
/// so the inner query folds all of them back into one row per post.
/// The filter runs on the folded tag array in the outer query.
static GET_POSTS_WITH_TAGS: Lazy<String> = Lazy::new(|| {
  format!(
    r#"
    WITH {VIEWER_CTE}
    SELECT posts_with_tags.* FROM (
      SELECT
        posts.string_id::text AS "p.post_id",
        parent_thread.string_id::text AS "p.parent_thread_id",
        parent.string_id::text AS "p.parent_post_id",
        {p_identity},
        posts.created AS "p.created",
        posts.content AS "p.content",
        COALESCE(ARRAY_AGG(DISTINCT tags.tag) FILTER (WHERE tags.tag IS NOT NULL), '{{}}') AS "p.index_tags",
        COALESCE(ARRAY_AGG(DISTINCT categories.category) FILTER (WHERE categories.category IS NOT NULL), '{{}}') AS "p.category_tags",
        COALESCE(ARRAY_AGG(DISTINCT content_warnings.warning) FILTER (WHERE content_warnings.warning IS NOT NULL), '{{}}') AS "p.content_warnings",
        COUNT(DISTINCT child_posts.id) AS "p.child_post_count",
        COUNT(DISTINCT comments.id) AS "p.child_comment_count",
        {p_new} AS "p.is_new",

        first_post.string_id::text AS "fp.post_id",
        parent_thread.string_id::text AS "fp.parent_thread_id",
        NULL::text AS "fp.parent_post_id",
        {fp_identity},
        first_post.created AS "fp.created",
        first_post.content AS "fp.content",
        COALESCE(ARRAY_AGG(DISTINCT fp_tags.tag) FILTER (WHERE fp_tags.tag IS NOT NULL), '{{}}') AS "fp.index_tags",
        COALESCE(ARRAY_AGG(DISTINCT fp_categories.category) FILTER (WHERE fp_categories.category IS NOT NULL), '{{}}') AS "fp.category_tags",
        COALESCE(ARRAY_AGG(DISTINCT fp_warnings.warning) FILTER (WHERE fp_warnings.warning IS NOT NULL), '{{}}') AS "fp.content_warnings",
        COUNT(DISTINCT fp_child_posts.id) AS "fp.child_post_count",
        COUNT(DISTINCT fp_comments.id) AS "fp.child_comment_count",
        {fp_new} AS "fp.is_new"
      FROM posts
      JOIN threads AS parent_thread ON parent_thread.id = posts.parent_thread
      LEFT JOIN posts AS parent ON parent.id = posts.parent_post
      LEFT JOIN viewer ON TRUE
      LEFT JOIN LATERAL (
        SELECT last_visit_time AS at FROM user_thread_last_visits
        WHERE user_thread_last_visits.thread_id = posts.parent_thread
          AND user_thread_last_visits.user_id = viewer.id
      ) AS last_visit ON TRUE
      LEFT JOIN LATERAL (
        SELECT dismiss_request_time AS at FROM dismiss_notifications_requests
        WHERE dismiss_notifications_requests.user_id = viewer.id
      ) AS dismissed ON TRUE
      {p_joins}
      LEFT JOIN post_tags ON post_tags.post_id = posts.id
      LEFT JOIN tags ON tags.id = post_tags.tag_id
      LEFT JOIN post_categories ON post_categories.post_id = posts.id
      LEFT JOIN categories ON categories.id = post_categories.category_id
      LEFT JOIN post_warnings ON post_warnings.post_id = posts.id
      LEFT JOIN content_warnings ON content_warnings.id = post_warnings.warning_id
      LEFT JOIN posts AS child_posts ON child_posts.parent_post = posts.id
      LEFT JOIN comments ON comments.parent_post = posts.id

      LEFT JOIN posts AS first_post
        ON first_post.parent_post IS NULL
        AND first_post.parent_thread = posts.parent_thread
        AND first_post.id != posts.id
      {fp_joins}
      LEFT JOIN post_tags AS fp_post_tags ON fp_post_tags.post_id = first_post.id
      LEFT JOIN tags AS fp_tags ON fp_tags.id = fp_post_tags.tag_id
      LEFT JOIN post_categories AS fp_post_categories ON fp_post_categories.post_id = first_post.id
      LEFT JOIN categories AS fp_categories ON fp_categories.id = fp_post_categories.category_id
      LEFT JOIN post_warnings AS fp_post_warnings ON fp_post_warnings.post_id = first_post.id
      LEFT JOIN content_warnings AS fp_warnings ON fp_warnings.id = fp_post_warnings.warning_id
      LEFT JOIN posts AS fp_child_posts ON fp_child_posts.parent_post = first_post.id
      LEFT JOIN comments AS fp_comments ON fp_comments.parent_post = first_post.id
      GROUP BY
        posts.id,
        parent_thread.id,
        parent.id,
        viewer.id,
        last_visit.at,
        dismissed.at,
        {p_group},
        first_post.id,
        {fp_group}
    ) AS posts_with_tags
    WHERE
      posts_with_tags."p.index_tags" @> $2::text[]
      AND NOT posts_with_tags."p.index_tags" && $3::text[]
    ORDER BY posts_with_tags."p.created" DESC"#,
    p_identity = identity_columns("p_", "p."),
    p_joins = identity_joins("posts", "p_"),
    p_group = identity_group_keys("p_"),
    p_new = is_new("posts.created", "posts.author"),
    fp_identity = identity_columns("fp_", "fp."),
    // roots have no first post to join an author onto
    fp_joins = identity_joins("first_post", "fp_").replace("JOIN users", "LEFT JOIN users"),
    fp_group = identity_group_keys("fp_"),
    fp_new = is_new("first_post.created", "first_post.author"),
  )
});

impl DbPostWithTags {
  /// Runs a tag search as seen by `firebase_id`.
  #[tracing::instrument(skip(conn, firebase_id), name = "db.tags.search")]
  pub async fn search(
    conn: &mut Connection,
    filter: &TagFilter,
    firebase_id: Option<&str>,
  ) -> Result<Vec<Self>> {
    let rows = sqlx::query_as::<_, Self>(&GET_POSTS_WITH_TAGS)
      .bind(firebase_id)
      .bind(filter.include())
      .bind(filter.exclude())
      .fetch_all(conn)
      .await
      .into_db_error()?;

    Ok(rows
      .into_iter()
      .filter(|row| filter.matches(&row.post.index_tags))
      .collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn filter(include: &[&str], exclude: &[&str]) -> TagFilter {
    TagFilter::new(
      include.iter().map(ToString::to_string).collect(),
      exclude.iter().map(ToString::to_string).collect(),
    )
    .unwrap()
  }

  #[test]
  fn empty_include_is_rejected() {
    assert!(TagFilter::new(Vec::new(), vec!["evil".into()]).is_err());
    assert!(TagFilter::from_query("exclude=evil").is_err());
    assert!(TagFilter::from_query("").is_err());
  }

  #[test]
  fn superset_and_disjoint() {
    let filter = filter(&["evil", "oddly specific"], &["good"]);
    assert!(filter.matches(&["evil", "oddly specific", "villain"]));
    assert!(!filter.matches(&["evil"]));
    assert!(!filter.matches(&["evil", "oddly specific", "good"]));
  }

  #[test]
  fn untagged_posts_never_match() {
    let filter = filter(&["evil"], &[]);
    assert!(!filter.matches::<&str>(&[]));
  }

  #[test]
  fn reads_repeated_query_keys() {
    let filter = TagFilter::from_query("tags=evil&tags=oddly%20specific&exclude=good&page=2").unwrap();
    assert_eq!(filter.include(), ["evil", "oddly specific"]);
    assert_eq!(filter.exclude(), ["good"]);
  }

  #[test]
  fn first_post_join_skips_the_post_itself() {
    assert!(GET_POSTS_WITH_TAGS.contains("first_post.id != posts.id"));
    assert!(GET_POSTS_WITH_TAGS.contains(r#""p.index_tags" @> $2::text[]"#));
    assert!(GET_POSTS_WITH_TAGS.contains(r#"NOT posts_with_tags."p.index_tags" && $3::text[]"#));
  }

  #[test]
  fn include_and_exclude_narrow_the_results() {
    let posts: [&[&str]; 3] = [&["a", "b"], &["a"], &["b", "c"]];
    let hits = |filter: &TagFilter| {
      posts
        .iter()
        .enumerate()
        .filter(|&(_, tags)| filter.matches(*tags))
        .map(|(index, _)| index)
        .collect::<Vec<_>>()
    };

    assert_eq!(hits(&filter(&["a"], &[])), [0, 1]);
    assert_eq!(hits(&filter(&["a"], &["c"])), [0, 1]);
    assert_eq!(hits(&filter(&["b"], &["c"])), [0]);
    assert_eq!(hits(&filter(&["a", "b"], &[])), [0]);
  }

  #[test]
  fn newness_is_computed_for_both_posts() {
    assert!(GET_POSTS_WITH_TAGS.contains(r#"AS "p.is_new""#));
    assert!(GET_POSTS_WITH_TAGS.contains(r#"AS "fp.is_new""#));
    assert!(GET_POSTS_WITH_TAGS.contains("first_post.author IS DISTINCT FROM viewer.id"));
    assert!(GET_POSTS_WITH_TAGS.contains("AS last_visit ON TRUE"));
    assert!(GET_POSTS_WITH_TAGS.contains("AS dismissed ON TRUE"));
  }
}
