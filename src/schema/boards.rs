use once_cell::sync::Lazy;

use super::VIEWER_CTE;
use crate::database::{Connection, ErrorExt, Result};
use crate::models::{DbBoardActivity, DbBoardSummary};

static GET_BOARDS: Lazy<String> = Lazy::new(|| {
  format!(
    r#"
    WITH {VIEWER_CTE}
    SELECT
      boards.string_id::text AS string_id,
      boards.slug,
      boards.tagline,
      boards.avatar_reference_id,
      COALESCE(boards.settings, '{{}}'::jsonb) AS settings,
      COALESCE(logged_out.restrictions::text[], '{{}}') AS logged_out_restrictions,
      COALESCE(logged_in.restrictions::text[], '{{}}') AS logged_in_base_restrictions,
      EXISTS (
        SELECT 1 FROM user_muted_boards
        WHERE user_muted_boards.user_id = viewer.id AND user_muted_boards.board_id = boards.id
      ) AS muted,
      pinned.pinned_order::bigint AS pinned_order
    FROM boards
    JOIN realms ON realms.id = boards.parent_realm
    LEFT JOIN viewer ON TRUE
    LEFT JOIN board_restrictions AS logged_out
      ON logged_out.board_id = boards.id AND logged_out.logged_in_only = FALSE
    LEFT JOIN board_restrictions AS logged_in
      ON logged_in.board_id = boards.id AND logged_in.logged_in_only = TRUE
    LEFT JOIN user_pinned_boards AS pinned
      ON pinned.board_id = boards.id AND pinned.user_id = viewer.id
    WHERE realms.string_id::text = $2
    ORDER BY boards.slug"#
  )
});

static GET_BOARDS_ACTIVITY: Lazy<String> = Lazy::new(|| {
  format!(
    r#"
    WITH {VIEWER_CTE},
    activity AS (
      SELECT
        threads.parent_board AS board_id,
        MAX(content.created) AS last_activity,
        MAX(content.created) FILTER (WHERE content.author IS DISTINCT FROM viewer.id) AS last_activity_from_others
      FROM threads
      JOIN (
        SELECT parent_thread, author, created FROM posts
        UNION ALL
        SELECT parent_thread, author, created FROM comments
      ) AS content ON content.parent_thread = threads.id
      LEFT JOIN viewer ON TRUE
      GROUP BY threads.parent_board
    )
    SELECT
      boards.string_id::text AS string_id,
      COALESCE(
        activity.last_activity_from_others > GREATEST(visits.last_visit_time, dismissed.dismiss_request_time),
        viewer.id IS NOT NULL AND activity.last_activity_from_others IS NOT NULL
      ) AS has_updates,
      activity.last_activity,
      activity.last_activity_from_others,
      visits.last_visit_time AS last_visit
    FROM boards
    JOIN realms ON realms.id = boards.parent_realm
    LEFT JOIN viewer ON TRUE
    LEFT JOIN activity ON activity.board_id = boards.id
    LEFT JOIN user_board_last_visits AS visits
      ON visits.board_id = boards.id AND visits.user_id = viewer.id
    LEFT JOIN dismiss_notifications_requests AS dismissed ON dismissed.user_id = viewer.id
    WHERE realms.string_id::text = $2
    ORDER BY boards.slug"#
  )
});

impl DbBoardSummary {
  #[tracing::instrument(skip(conn, firebase_id), name = "db.boards.summaries")]
  pub async fn for_realm(
    conn: &mut Connection,
    realm_string_id: &str,
    firebase_id: Option<&str>,
  ) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(&GET_BOARDS)
      .bind(firebase_id)
      .bind(realm_string_id)
      .fetch_all(conn)
      .await
      .into_db_error()
  }
}

impl DbBoardActivity {
  #[tracing::instrument(skip(conn, firebase_id), name = "db.boards.activity")]
  pub async fn for_realm(
    conn: &mut Connection,
    realm_string_id: &str,
    firebase_id: Option<&str>,
  ) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(&GET_BOARDS_ACTIVITY)
      .bind(firebase_id)
      .bind(realm_string_id)
      .fetch_all(conn)
      .await
      .into_db_error()
  }
}
