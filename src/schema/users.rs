use crate::database::{Connection, ErrorExt, Result};
use crate::models::{DbUser, UserSetting};

impl DbUser {
  #[tracing::instrument(skip_all, name = "db.users.by_firebase_id")]
  pub async fn by_firebase_id(conn: &mut Connection, firebase_id: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"
      SELECT id::bigint AS id, firebase_id, username, avatar_reference_id
      FROM users WHERE firebase_id = $1 LIMIT 1"#,
    )
    .bind(firebase_id)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Clears every notification the user has up to now.
  #[tracing::instrument(skip_all, name = "db.users.dismiss_notifications")]
  pub async fn dismiss_notifications(conn: &mut Connection, firebase_id: &str) -> Result<()> {
    sqlx::query(
      r#"
      INSERT INTO dismiss_notifications_requests(user_id)
      SELECT id FROM users WHERE firebase_id = $1
      ON CONFLICT(user_id) DO UPDATE
        SET dismiss_request_time = DEFAULT"#,
    )
    .bind(firebase_id)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(())
  }
}

impl UserSetting {
  #[tracing::instrument(skip_all, name = "db.users.settings")]
  pub async fn list(conn: &mut Connection, firebase_id: &str) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(
      r#"
      SELECT
        user_settings.setting_name AS name,
        user_settings.setting_value AS value,
        setting_types.type AS type
      FROM user_settings
      JOIN setting_types ON setting_types.name = user_settings.setting_name
      WHERE user_settings.user_id = (SELECT id FROM users WHERE firebase_id = $1)
      ORDER BY user_settings.setting_name"#,
    )
    .bind(firebase_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  /// Type of a known setting, `None` when no setting has that name.
  #[tracing::instrument(skip(conn), name = "db.users.setting_type")]
  pub async fn setting_type(conn: &mut Connection, name: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>("SELECT type FROM setting_types WHERE name = $1")
      .bind(name)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, firebase_id, value), name = "db.users.update_setting")]
  pub async fn update(
    conn: &mut Connection,
    firebase_id: &str,
    name: &str,
    value: &str,
  ) -> Result<()> {
    sqlx::query(
      r#"
      INSERT INTO user_settings(user_id, setting_name, setting_value)
      SELECT id, $2, $3 FROM users WHERE firebase_id = $1
      ON CONFLICT(user_id, setting_name) DO UPDATE
        SET setting_value = EXCLUDED.setting_value"#,
    )
    .bind(firebase_id)
    .bind(name)
    .bind(value)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(())
  }
}
