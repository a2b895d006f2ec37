use error_stack::ResultExt;

use crate::database::{ensure_single_row, Connection, ErrorExt, Result, Transaction};
use crate::models::{DbRealmInvite, InviteDetails};

const NONCE_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const NONCE_LENGTH: usize = 64;

/// Generates the secret part of an invite link.
#[must_use]
pub fn generate_nonce() -> String {
  random_string::generate(NONCE_LENGTH, NONCE_CHARSET)
}

/// Where an invite stands from the point of view of whoever opens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
  Pending,
  Used,
  Expired,
}

impl InviteDetails {
  #[must_use]
  pub fn status(&self) -> InviteStatus {
    if self.expired {
      InviteStatus::Expired
    } else if self.used {
      InviteStatus::Used
    } else {
      InviteStatus::Pending
    }
  }

  #[tracing::instrument(skip_all, name = "db.invites.by_nonce")]
  pub async fn by_nonce(conn: &mut Connection, nonce: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"
      SELECT
        realms.string_id::text AS realm_string_id,
        account_invites.inviter::bigint AS inviter,
        account_invites.invitee_email,
        account_invites.created + account_invites.duration < NOW() AS expired,
        account_invites.used
      FROM account_invites
      JOIN realms ON realms.id = account_invites.realm_id
      WHERE account_invites.nonce = $1
      ORDER BY account_invites.created
      LIMIT 1"#,
    )
    .bind(nonce)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Marks the invite as used and adds the user to the realm. Runs
  /// inside the caller's transaction.
  ///
  /// Fails when the invite was used or expired in the meantime, or when
  /// the user has no row to add. The caller must then drop the
  /// transaction instead of committing it.
  #[tracing::instrument(skip_all, name = "db.invites.accept")]
  pub async fn accept(
    tx: &mut Transaction<'_>,
    nonce: &str,
    firebase_id: &str,
    realm_string_id: &str,
  ) -> Result<()> {
    let updated = sqlx::query(
      r#"
      UPDATE account_invites SET used = TRUE
      WHERE nonce = $1
        AND NOT used
        AND created + duration >= NOW()"#,
    )
    .bind(nonce)
    .execute(&mut **tx)
    .await
    .into_db_error()?;

    ensure_single_row(updated.rows_affected())
      .attach_printable("invite is no longer pending")?;

    let inserted = sqlx::query(
      r#"
      INSERT INTO realm_users(realm_id, user_id)
      SELECT realms.id, users.id FROM realms, users
      WHERE realms.string_id::text = $1 AND users.firebase_id = $2
      ON CONFLICT DO NOTHING"#,
    )
    .bind(realm_string_id)
    .bind(firebase_id)
    .execute(&mut **tx)
    .await
    .into_db_error()?;

    ensure_single_row(inserted.rows_affected())
      .attach_printable("user could not be added to the realm")
  }
}

impl DbRealmInvite {
  /// Invites of a realm that can still be accepted, newest first.
  #[tracing::instrument(skip(conn), name = "db.invites.list")]
  pub async fn list_pending(conn: &mut Connection, realm_string_id: &str) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(
      r#"
      SELECT
        account_invites.nonce,
        account_invites.inviter::bigint AS inviter_id,
        account_invites.invitee_email,
        account_invites.created,
        account_invites.created + account_invites.duration AS expires_at,
        account_invites.label
      FROM account_invites
      JOIN realms ON realms.id = account_invites.realm_id
      WHERE realms.string_id::text = $1
        AND NOT account_invites.used
        AND account_invites.created + account_invites.duration > NOW()
      ORDER BY account_invites.created DESC"#,
    )
    .bind(realm_string_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn, nonce, email), name = "db.invites.create")]
  pub async fn create(
    conn: &mut Connection,
    realm_string_id: &str,
    inviter_id: i64,
    nonce: &str,
    email: &str,
    label: Option<&str>,
  ) -> Result<()> {
    sqlx::query(
      r#"
      INSERT INTO account_invites(realm_id, inviter, nonce, invitee_email, label, duration)
      SELECT realms.id, $2, $3, $4, $5, INTERVAL '1 week'
      FROM realms WHERE realms.string_id::text = $1"#,
    )
    .bind(realm_string_id)
    .bind(inviter_id)
    .bind(nonce)
    .bind(email)
    .bind(label)
    .execute(conn)
    .await
    .into_db_error()?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn details(expired: bool, used: bool) -> InviteDetails {
    InviteDetails {
      realm_string_id: "realm".into(),
      inviter: 1,
      invitee_email: "ms.boba@boba.social".into(),
      expired,
      used,
    }
  }

  #[test]
  fn expired_wins_over_used() {
    assert_eq!(details(false, false).status(), InviteStatus::Pending);
    assert_eq!(details(false, true).status(), InviteStatus::Used);
    assert_eq!(details(true, true).status(), InviteStatus::Expired);
  }

  #[test]
  fn nonces_are_long_and_alphanumeric() {
    let nonce = generate_nonce();
    assert_eq!(nonce.len(), 64);
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(nonce, generate_nonce());
  }

  #[test]
  fn status_serializes_in_snake_case() {
    assert_eq!(serde_json::to_value(InviteStatus::Pending).unwrap(), "pending");
  }
}
