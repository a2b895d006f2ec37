//! Postgres pools.
//!
//! The primary pool takes every write, the optional replica serves
//! reads and falls back to the primary while unhealthy (see
//! [`crate::App::db_read`]).
use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::Executor;
use std::{str::FromStr, time::Duration};

use crate::config;

mod error;
pub use error::*;

pub type Transaction<'a> = sqlx::Transaction<'a, sqlx::Postgres>;
pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;
pub type Connection = sqlx::PgConnection;

#[derive(Clone)]
pub struct Pool {
  pool: sqlx::PgPool,
}

impl Pool {
  #[tracing::instrument(skip_all, fields(readonly = pool_cfg.readonly), name = "db.pool.new")]
  pub(crate) async fn new(
    global_cfg: &config::Database,
    pool_cfg: &config::DbPoolConfig,
  ) -> Result<Self> {
    let mut pool_opts = PgPoolOptions::new()
      .acquire_timeout(Duration::from_secs(global_cfg.timeout_secs.get()))
      .max_connections(pool_cfg.pool_size.get());

    if let Some(min_idle) = pool_cfg.min_idle {
      pool_opts = pool_opts.min_connections(min_idle.get());
    }

    if pool_cfg.readonly {
      pool_opts = pool_opts.after_connect(|conn, _meta| {
        Box::pin(async move {
          conn.execute("SET default_transaction_read_only = on")
            .await
            .map(|_| ())
        })
      });
    }

    let mut connect_opts =
      PgConnectOptions::from_str(&pool_cfg.url).change_context(Error::InvalidUrl)?;

    if global_cfg.enforce_tls {
      connect_opts = connect_opts.ssl_mode(PgSslMode::Prefer);
    }

    let pool = Self {
      pool: pool_opts.connect_lazy_with(connect_opts),
    };

    match pool.wait_until_healthy().await {
      Ok(..) => {}
      Err(err) if err.is_unhealthy() => {
        tracing::warn!("database pool is unhealthy at startup, continuing anyway");
      }
      Err(err) => return Err(err),
    }

    Ok(pool)
  }
}

/// Connection level failures mean the database cannot be reached at the
/// moment, anything else is reported as is.
fn classify_acquire_error(err: sqlx::Error) -> Report<Error> {
  match err {
    sqlx::Error::PoolTimedOut | sqlx::Error::Io(..) | sqlx::Error::Tls(..) => {
      Report::new(err).change_context(Error::UnhealthyPool)
    }
    err => Report::new(Error::Internal(err)),
  }
}

impl std::fmt::Debug for Pool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.pool.fmt(f)
  }
}

impl Pool {
  #[tracing::instrument(name = "db.transaction", skip(self))]
  pub async fn begin(&self) -> Result<Transaction<'static>> {
    self.pool.begin().await.map_err(classify_acquire_error)
  }

  #[tracing::instrument(name = "db.connect", skip(self))]
  pub async fn get(&self) -> Result<PoolConnection> {
    match self.pool.try_acquire() {
      Some(conn) => Ok(conn),
      None => self.pool.acquire().await.map_err(classify_acquire_error),
    }
  }

  #[tracing::instrument(skip(self))]
  pub async fn wait_until_healthy(&self) -> Result<()> {
    self.get().await.map(|_| ())
  }

  pub async fn close(&self) {
    self.pool.close().await;
  }
}
