//! Redis cache handle.
//!
//! Built once at startup from [`config::Cache`] and carried by
//! [`App`](crate::App). Nothing in here is global: with no cache
//! configured the app simply holds `None`.
use deadpool_redis::redis::cmd;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use error_stack::{Result, ResultExt};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not create cache pool")]
  Create,
  #[error("could not acquire cache connection")]
  Acquire,
  #[error("cache command failed")]
  Command,
  #[error("could not (de)serialize cached value")]
  Serde,
}

/// Hashes kept in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
  /// Users by their identity provider id.
  User,
}

impl CacheKey {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::User => "USER",
    }
  }
}

#[derive(Clone)]
pub struct Cache {
  pool: Pool,
}

impl std::fmt::Debug for Cache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Cache")
      .field("status", &self.pool.status())
      .finish()
  }
}

impl Cache {
  #[tracing::instrument(skip_all, name = "cache.connect")]
  pub fn connect(cfg: &config::Cache) -> Result<Self, Error> {
    let mut pool_cfg = Config::from_url(cfg.url.as_str());
    pool_cfg.pool = Some(PoolConfig::new(cfg.pool_size.get()));

    let pool = pool_cfg
      .create_pool(Some(Runtime::Tokio1))
      .change_context(Error::Create)?;

    Ok(Self { pool })
  }

  pub fn close(&self) {
    self.pool.close();
  }

  async fn conn(&self) -> Result<Connection, Error> {
    self.pool.get().await.change_context(Error::Acquire)
  }

  #[tracing::instrument(skip(self), name = "cache.hget")]
  pub async fn hget<T: DeserializeOwned>(
    &self,
    key: CacheKey,
    field: &str,
  ) -> Result<Option<T>, Error> {
    let mut conn = self.conn().await?;
    let raw: Option<String> = cmd("HGET")
      .arg(key.as_str())
      .arg(field)
      .query_async(&mut conn)
      .await
      .change_context(Error::Command)?;

    raw.map(|raw| serde_json::from_str(&raw).change_context(Error::Serde))
      .transpose()
  }

  #[tracing::instrument(skip(self, value), name = "cache.hset")]
  pub async fn hset<T: Serialize>(
    &self,
    key: CacheKey,
    field: &str,
    value: &T,
  ) -> Result<(), Error> {
    let raw = serde_json::to_string(value).change_context(Error::Serde)?;

    let mut conn = self.conn().await?;
    let _: i64 = cmd("HSET")
      .arg(key.as_str())
      .arg(field)
      .arg(raw)
      .query_async(&mut conn)
      .await
      .change_context(Error::Command)?;

    Ok(())
  }

  #[tracing::instrument(skip(self), name = "cache.hdel")]
  pub async fn hdel(&self, key: CacheKey, field: &str) -> Result<(), Error> {
    let mut conn = self.conn().await?;
    let _: i64 = cmd("HDEL")
      .arg(key.as_str())
      .arg(field)
      .query_async(&mut conn)
      .await
      .change_context(Error::Command)?;

    Ok(())
  }
}
