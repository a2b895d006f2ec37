use serde::Deserialize;
use std::num::NonZeroUsize;

use crate::util::validation::{is_valid_url, Violations};

#[derive(Deserialize)]
pub struct Cache {
  /// **Environment variables**:
  /// - `BOBA_CACHE_URL` or `REDIS_URL`
  pub url: String,
  /// **Environment variables**:
  /// - `BOBA_CACHE_POOL_SIZE`
  #[serde(default = "Cache::default_pool_size")]
  pub pool_size: NonZeroUsize,
}

impl std::fmt::Debug for Cache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Cache")
      .field("url", &"<hidden>")
      .field("pool_size", &self.pool_size)
      .finish()
  }
}

impl Cache {
  const DEFAULT_POOL_SIZE: usize = 8;

  const fn default_pool_size() -> NonZeroUsize {
    match NonZeroUsize::new(Self::DEFAULT_POOL_SIZE) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
    }
  }

  pub(crate) fn validate(&self) -> Violations {
    let mut violations = Violations::new();
    violations.check(
      is_valid_url(&self.url, &["redis", "rediss"]),
      "url",
      "Invalid Redis connection URL",
    );
    violations
  }
}
