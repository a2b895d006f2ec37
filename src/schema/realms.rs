use crate::database::{Connection, ErrorExt, Result};
use crate::models::RealmIds;

impl RealmIds {
  #[tracing::instrument(skip(conn), name = "db.realms.by_slug")]
  pub async fn by_slug(conn: &mut Connection, slug: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>("SELECT string_id::text AS string_id, slug FROM realms WHERE slug = $1")
      .bind(slug)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.realms.by_string_id")]
  pub async fn by_string_id(conn: &mut Connection, realm_id: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      "SELECT string_id::text AS string_id, slug FROM realms WHERE string_id::text = $1",
    )
    .bind(realm_id)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Raw permission tokens the user holds in this realm through their
  /// roles. Empty for logged out viewers.
  #[tracing::instrument(skip(self, conn, firebase_id), name = "db.realms.user_permissions")]
  pub async fn user_permissions(
    &self,
    conn: &mut Connection,
    firebase_id: Option<&str>,
  ) -> Result<Vec<String>> {
    let Some(firebase_id) = firebase_id else {
      return Ok(Vec::new());
    };

    sqlx::query_scalar::<_, String>(
      r#"
      SELECT DISTINCT UNNEST(roles.permissions)::text
      FROM realm_user_roles
      JOIN roles ON roles.id = realm_user_roles.role_id
      JOIN realms ON realms.id = realm_user_roles.realm_id
      JOIN users ON users.id = realm_user_roles.user_id
      WHERE realms.string_id::text = $1 AND users.firebase_id = $2"#,
    )
    .bind(&self.string_id)
    .bind(firebase_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(self, conn, firebase_id), name = "db.realms.has_member")]
  pub async fn has_member(&self, conn: &mut Connection, firebase_id: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
      r#"
      SELECT EXISTS (
        SELECT 1 FROM realm_users
        JOIN realms ON realms.id = realm_users.realm_id
        JOIN users ON users.id = realm_users.user_id
        WHERE realms.string_id::text = $1 AND users.firebase_id = $2
      )"#,
    )
    .bind(&self.string_id)
    .bind(firebase_id)
    .fetch_one(conn)
    .await
    .into_db_error()
  }
}
