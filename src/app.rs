use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::{
  cache::{self, Cache, CacheKey},
  config,
  database::{self, ErrorExt2},
};

/// Everything a request handler needs, cheap to clone.
#[derive(Debug, Clone)]
pub struct App {
  pub config: Arc<config::Server>,
  pub primary_db: database::Pool,
  pub replica_db: Option<database::Pool>,
  pub cache: Option<Cache>,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
  #[tracing::instrument(skip_all)]
  pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
    let primary_db = database::Pool::new(&cfg.db, &cfg.db.primary)
      .await
      .change_context(AppError)?;

    let replica_db = if let Some(replica) = cfg.db.replica.as_ref() {
      Some(
        database::Pool::new(&cfg.db, replica)
          .await
          .change_context(AppError)?,
      )
    } else {
      None
    };

    let cache = cfg
      .cache
      .as_ref()
      .map(Cache::connect)
      .transpose()
      .change_context(AppError)?;

    let app = Self {
      config: Arc::new(cfg),
      primary_db,
      replica_db,
      cache,
    };

    Ok(app)
  }

  pub async fn close(&self) {
    if let Some(cache) = self.cache.as_ref() {
      cache.close();
    }
    if let Some(replica) = self.replica_db.as_ref() {
      replica.close().await;
    }
    self.primary_db.close().await;
  }
}

impl App {
  #[tracing::instrument(skip_all)]
  pub async fn db_write(&self) -> Result<database::PoolConnection, database::Error> {
    self.primary_db.get().await
  }

  #[tracing::instrument(skip_all)]
  pub async fn db_read(&self) -> Result<database::PoolConnection, database::Error> {
    if let Some(replica) = self.replica_db.as_ref() {
      match replica.get().await {
        Ok(conn) => return Ok(conn),
        // fallback
        Err(err) if err.is_unhealthy() => {}
        Err(err) => return Err(err),
      }
    }
    self.primary_db.get().await
  }

  #[tracing::instrument(skip_all)]
  pub async fn db_read_prefer_primary(
    &self,
  ) -> Result<database::PoolConnection, database::Error> {
    match (self.primary_db.get().await, self.replica_db.as_ref()) {
      (Ok(conn), ..) => Ok(conn),
      (Err(e), Some(readonly_replica)) if e.is_unhealthy() => readonly_replica.get().await,
      (Err(e), ..) => Err(e),
    }
  }
}

// Cache failures never fail a request, they only turn into misses.
impl App {
  pub async fn cache_get<T: serde::de::DeserializeOwned>(
    &self,
    key: CacheKey,
    field: &str,
  ) -> Option<T> {
    let cache = self.cache.as_ref()?;
    match cache.hget(key, field).await {
      Ok(value) => value,
      Err(report) => {
        log_cache_error(&report);
        None
      }
    }
  }

  pub async fn cache_set<T: serde::Serialize>(&self, key: CacheKey, field: &str, value: &T) {
    if let Some(cache) = self.cache.as_ref() {
      if let Err(report) = cache.hset(key, field, value).await {
        log_cache_error(&report);
      }
    }
  }

  pub async fn cache_del(&self, key: CacheKey, field: &str) {
    if let Some(cache) = self.cache.as_ref() {
      if let Err(report) = cache.hdel(key, field).await {
        log_cache_error(&report);
      }
    }
  }
}

fn log_cache_error(report: &error_stack::Report<cache::Error>) {
  tracing::warn!(error = ?report, "cache operation failed");
}

#[cfg(test)]
mod tests {
  use super::*;
  use static_assertions::assert_impl_all;

  assert_impl_all!(App: Send, Sync, Clone);
}
