use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};

use crate::util::validation::{is_valid_url, Violations};

#[derive(Debug, Deserialize)]
pub struct Database {
  /// Writable primary database.
  pub primary: DbPoolConfig,
  /// A read-only replica database used for accessing the data
  /// without interacting with the main database.
  pub replica: Option<DbPoolConfig>,
  /// Forces all database connections are encrypted with TLS
  /// (if possible).
  ///
  /// **Environment variables**:
  /// - `BOBA_DB_ENFORCE_TLS`
  #[serde(default = "DbPoolConfig::default_enforce_tls")]
  pub enforce_tls: bool,
  /// How long to wait for a connection before giving up.
  ///
  /// **Environment variables**:
  /// - `BOBA_DB_TIMEOUT_SECS`
  #[serde(default = "DbPoolConfig::default_pool_timeout_secs")]
  pub timeout_secs: NonZeroU64,
}

impl Database {
  pub(crate) fn validate(&self) -> Violations {
    let mut violations = Violations::new();
    violations.nested("primary", self.primary.validate());
    if let Some(replica) = self.replica.as_ref() {
      violations.nested("replica", replica.validate());
    }
    violations
  }
}

/// Configuration for connecting to any Postgres database
#[derive(Deserialize)]
pub struct DbPoolConfig {
  /// Every session of this pool starts with
  /// `default_transaction_read_only` turned on.
  ///
  /// **Environment variables**:
  /// - `BOBA_DB_PRIMARY_READONLY`
  /// - `BOBA_DB_REPLICA_READONLY`
  #[serde(default)]
  pub readonly: bool,
  /// **Environment variables**:
  /// - `BOBA_DB_PRIMARY_MIN_IDLE`
  /// - `BOBA_DB_REPLICA_MIN_IDLE`
  pub min_idle: Option<NonZeroU32>,
  /// Maximum amount of connections the pool may hold.
  ///
  /// **Environment variables**:
  /// - `BOBA_DB_PRIMARY_POOL_SIZE`
  /// - `BOBA_DB_REPLICA_POOL_SIZE`
  #[serde(default = "DbPoolConfig::default_pool_size")]
  pub pool_size: NonZeroU32,
  /// Connection URL connecting to the Postgres database.
  ///
  /// **Environment variables**:
  /// - `BOBA_DB_PRIMARY_URL` or `DATABASE_URL`
  /// - `BOBA_DB_REPLICA_URL`
  pub url: String,
}

impl std::fmt::Debug for DbPoolConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DbPoolConfig")
      .field("readonly", &self.readonly)
      .field("min_idle", &self.min_idle)
      .field("pool_size", &self.pool_size)
      .field("url", &"<hidden>")
      .finish()
  }
}

impl DbPoolConfig {
  const DEFAULT_POOL_SIZE: u32 = 5;
  const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

  // Required by serde
  const fn default_pool_size() -> NonZeroU32 {
    match NonZeroU32::new(Self::DEFAULT_POOL_SIZE) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
    }
  }

  const fn default_pool_timeout_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_POOL_TIMEOUT_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_TIMEOUT_SECS is accidentally set to 0"),
    }
  }

  const fn default_enforce_tls() -> bool {
    true
  }

  fn validate(&self) -> Violations {
    let mut violations = Violations::new();
    violations.check(
      is_valid_url(&self.url, &["postgres", "postgresql"]),
      "url",
      "Invalid Postgres connection URL",
    );
    violations
  }
}
