//! SQL text and the fetch functions that run it.
//!
//! Every query that returns posts or comments takes the viewer's
//! identity provider id (or `None` for logged out viewers) and computes
//! the viewer-relative `self` and `friend` flags in SQL.
pub mod boards;
pub mod invites;
pub mod realms;
pub mod tags;
pub mod threads;
pub mod users;

pub use tags::{EmptyIncludeTags, TagFilter};

/// Resolves the viewer row. Produces no row for logged out viewers or
/// unknown ids, so it must always be joined with `LEFT JOIN viewer ON TRUE`.
const VIEWER_CTE: &str = "viewer AS (SELECT id FROM users WHERE firebase_id = $1)";

/// Whether a row was created after the viewer last looked at the
/// thread. Always false for logged out viewers and for the viewer's own
/// contributions.
///
/// Expects `viewer`, `last_visit.at` and `dismissed.at` to be in scope.
fn is_new(created: &str, author: &str) -> String {
  format!(
    "(viewer.id IS NOT NULL AND {author} IS DISTINCT FROM viewer.id \
     AND (last_visit.at IS NULL OR {created} > last_visit.at) \
     AND (dismissed.at IS NULL OR {created} > dismissed.at))"
  )
}

/// Joins the author of `{source}` together with the identity they were
/// given in that thread. Every joined alias is prefixed with `alias`.
fn identity_joins(source: &str, alias: &str) -> String {
  format!(
    r#"
    JOIN users AS {alias}author ON {alias}author.id = {source}.author
    LEFT JOIN user_thread_identities AS {alias}uti
      ON {alias}uti.user_id = {source}.author AND {alias}uti.thread_id = {source}.parent_thread
    LEFT JOIN secret_identities AS {alias}si ON {alias}si.id = {alias}uti.identity_id
    LEFT JOIN roles AS {alias}role ON {alias}role.id = {alias}uti.role_id
    LEFT JOIN LATERAL (
      SELECT accessories.image_reference_id
      FROM identity_thread_accessories AS ita
      JOIN accessories ON accessories.id = ita.accessory_id
      WHERE ita.thread_id = {source}.parent_thread
        AND (ita.identity_id = {alias}uti.identity_id OR ita.role_id = {alias}uti.role_id)
      LIMIT 1
    ) AS {alias}accessory ON TRUE"#
  )
}

/// Author identity columns matching [`AuthorIdentity`], named
/// `{column}author`, `{column}username` and so on.
///
/// [`AuthorIdentity`]: crate::models::AuthorIdentity
fn identity_columns(alias: &str, column: &str) -> String {
  format!(
    r#"
    {alias}author.id::bigint AS "{column}author",
    {alias}author.username AS "{column}username",
    COALESCE({alias}author.avatar_reference_id, '') AS "{column}user_avatar",
    COALESCE({alias}role.name, {alias}si.display_name, '') AS "{column}secret_identity_name",
    COALESCE({alias}role.avatar_reference_id, {alias}si.avatar_reference_id, '') AS "{column}secret_identity_avatar",
    {alias}role.color AS "{column}secret_identity_color",
    {alias}accessory.image_reference_id AS "{column}accessory_avatar",
    EXISTS (
      SELECT 1 FROM friends
      WHERE friends.user_id = viewer.id AND friends.friend_id = {alias}author.id
    ) AS "{column}friend",
    COALESCE({alias}author.id = viewer.id, FALSE) AS "{column}self""#
  )
}

/// Primary keys of every one-to-one table joined by [`identity_joins`].
/// Grouped queries need them in their `GROUP BY` to select the columns
/// of [`identity_columns`].
fn identity_group_keys(alias: &str) -> String {
  format!("{alias}author.id, {alias}si.id, {alias}role.id, {alias}accessory.image_reference_id")
}
