use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};

use super::ParseError;
use crate::util::{figment::FigmentErrorAttachable, validation::Violations};

#[derive(Debug, Deserialize)]
pub struct Server {
  /// **Environment variables**:
  /// - `BOBA_IP`
  #[serde(default = "Server::default_ip")]
  pub ip: IpAddr,
  /// **Environment variables**:
  /// - `BOBA_PORT`
  #[serde(default = "Server::default_port")]
  pub port: u16,
  /// Amount of actix workers. Defaults to the available parallelism
  /// of the machine.
  ///
  /// **Environment variables**:
  /// - `BOBA_WORKERS`
  #[serde(default = "Server::default_workers")]
  pub workers: usize,
  pub db: super::Database,
  pub auth: super::Auth,
  /// Leaving this out disables caching entirely.
  pub cache: Option<super::Cache>,
  #[serde(default)]
  pub logging: super::Logging,
  #[serde(default)]
  pub invites: super::Invites,
}

impl Server {
  pub fn load() -> Result<Self, ParseError> {
    dotenvy::dotenv().ok();

    let config = Self::figment()
      .extract::<Self>()
      .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    config.validate().into_result(ParseError)?;
    Ok(config)
  }

  pub(crate) fn validate(&self) -> Violations {
    let mut violations = Violations::new();
    violations.check(self.workers > 0, "workers", "must be at least 1");
    violations.nested("db", self.db.validate());
    violations.nested("auth", self.auth.validate());
    if let Some(cache) = self.cache.as_ref() {
      violations.nested("cache", cache.validate());
    }
    violations
  }
}

impl Server {
  const DEFAULT_CONFIG_FILE: &'static str = "boba.toml";

  const fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  }

  const fn default_port() -> u16 {
    4200
  }

  fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
  }

  /// Creates a default [`Figment`] object to load server
  /// configuration. This function is there for [`Server::load`]
  /// and testing.
  ///
  /// [`Figment`]: figment::Figment
  pub(crate) fn figment() -> figment::Figment {
    use figment::{
      providers::{Env, Format, Toml},
      Figment,
    };

    Figment::new()
      .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
      // Keys with underscores in them have to be mapped by hand,
      // everything else splits on `_`.
      .merge(Env::prefixed("BOBA_").map(|v| match v.as_str() {
        "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
        "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

        "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
        "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

        "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
        "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

        "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),
        "CACHE_POOL_SIZE" => "cache.pool_size".into(),
        "INVITES_BASE_DOMAIN" => "invites.base_domain".into(),

        _ => v.as_str().replace('_', ".").into(),
      }))
      // Environment variable aliases
      .merge(
        Env::raw()
          .only(&["DATABASE_URL", "REDIS_URL"])
          .map(|v| match v.as_str() {
            "DATABASE_URL" => "db.primary.url".into(),
            "REDIS_URL" => "cache.url".into(),
            _ => v.into(),
          }),
      )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LoggingStyle;
  use figment::Jail;
  use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};

  const SECRET: &str = "this is a very secret key";

  #[test]
  fn env_aliases() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://boba@localhost/boba");
      jail.set_env("REDIS_URL", "redis://localhost:6379");
      jail.set_env("BOBA_AUTH_JWT_SECRET", SECRET);

      jail.set_env("BOBA_DB_PRIMARY_MIN_IDLE", "100");
      jail.set_env("BOBA_DB_PRIMARY_POOL_SIZE", "100");

      jail.set_env("BOBA_DB_REPLICA_URL", "postgres://boba@replica/boba");
      jail.set_env("BOBA_DB_REPLICA_READONLY", "true");
      jail.set_env("BOBA_DB_REPLICA_MIN_IDLE", "589");
      jail.set_env("BOBA_DB_REPLICA_POOL_SIZE", "589");

      jail.set_env("BOBA_DB_ENFORCE_TLS", "false");
      jail.set_env("BOBA_DB_TIMEOUT_SECS", "3030");
      jail.set_env("BOBA_CACHE_POOL_SIZE", "16");

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.db.primary.url, "postgres://boba@localhost/boba");
      assert_eq!(config.db.primary.min_idle, NonZeroU32::new(100));
      assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());

      let replica = config.db.replica.as_ref().unwrap();
      assert!(replica.readonly);
      assert_eq!(replica.min_idle, NonZeroU32::new(589));
      assert_eq!(replica.pool_size, NonZeroU32::new(589).unwrap());

      assert!(!config.db.enforce_tls);
      assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());

      let cache = config.cache.as_ref().unwrap();
      assert_eq!(cache.url, "redis://localhost:6379");
      assert_eq!(cache.pool_size, NonZeroUsize::new(16).unwrap());
      assert_eq!(config.auth.jwt_secret, SECRET);

      Ok(())
    });
  }

  #[test]
  fn defaults() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://boba@localhost/boba");
      jail.set_env("BOBA_AUTH_JWT_SECRET", SECRET);

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.port, 4200);
      assert!(config.db.enforce_tls);
      assert!(!config.db.primary.readonly);
      assert_eq!(config.db.primary.pool_size, NonZeroU32::new(5).unwrap());
      assert_eq!(config.db.timeout_secs, NonZeroU64::new(5).unwrap());
      assert!(config.cache.is_none());
      assert_eq!(config.logging.style, LoggingStyle::Full);
      assert_eq!(config.invites.base_domain, "boba.social");
      assert!(config.validate().is_empty());

      Ok(())
    });
  }

  #[test]
  fn reads_toml_file() {
    Jail::expect_with(|jail| {
      jail.create_file(
        "boba.toml",
        r#"
        port = 8080

        [db.primary]
        url = "postgres://boba@localhost/boba"

        [auth]
        jwt_secret = "this is a very secret key"
        issuer = "https://securetoken.google.com/boba"

        [logging]
        style = "json"
        targets = "boba=debug"
        "#,
      )?;

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.port, 8080);
      assert_eq!(config.logging.style, LoggingStyle::JSON);
      assert_eq!(config.logging.targets.as_deref(), Some("boba=debug"));
      assert!(config.auth.issuer.is_some());

      Ok(())
    });
  }

  #[test]
  fn validation_reports_every_field() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "mysql://boba@localhost/boba");
      jail.set_env("REDIS_URL", "http://localhost");
      jail.set_env("BOBA_AUTH_JWT_SECRET", "short");

      let config: Server = Server::figment().extract()?;
      let report = config.validate().into_result(ParseError).unwrap_err();
      let message = format!("{report:?}");

      assert!(message.contains("db.primary.url: Invalid Postgres connection URL"));
      assert!(message.contains("cache.url: Invalid Redis connection URL"));
      assert!(message.contains("auth.jwt_secret: Invalid JWT secret key"));

      Ok(())
    });
  }
}
