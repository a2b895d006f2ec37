use error_stack::{Context, Report};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use url::Url;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
  #[allow(clippy::unwrap_used)]
  Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$").unwrap()
});

/// Validates an e-mail address used for realm invites.
///
/// Host names in IP address form are rejected, invites are only ever
/// meant for addresses behind a real domain.
pub fn is_valid_email(email: &str) -> bool {
  let host_is_ip = email
    .rsplit_once('@')
    .is_some_and(|(_, host)| host.parse::<IpAddr>().is_ok());

  EMAIL_REGEX.is_match(email) && email.len() <= 254 && !host_is_ip
}

/// Whether `value` parses as a URL whose scheme is one of `schemes`.
pub fn is_valid_url(value: &str, schemes: &[&str]) -> bool {
  Url::parse(value)
    .map(|url| schemes.contains(&url.scheme()))
    .unwrap_or(false)
}

/// Collects every `field: message` violation found while validating a
/// value, so all of them can be reported at once.
#[derive(Debug, Default)]
pub struct Violations {
  entries: Vec<String>,
}

impl Violations {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn check(&mut self, valid: bool, field: &str, message: &str) {
    if !valid {
      self.entries.push(format!("{field}: {message}"));
    }
  }

  /// Validation of a nested value, its fields get prefixed with `field`.
  pub fn nested(&mut self, field: &str, inner: Violations) {
    self.entries.extend(
      inner
        .entries
        .into_iter()
        .map(|entry| format!("{field}.{entry}")),
    );
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn into_result<C: Context>(self, context: C) -> error_stack::Result<(), C> {
    if self.entries.is_empty() {
      return Ok(());
    }

    let mut report = Report::new(context);
    for entry in self.entries {
      report = report.attach_printable(entry);
    }
    Err(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_valid_email() {
    assert!(is_valid_email("gush@gmail.com"));
    assert!(is_valid_email("Bobatan@Boba.Social"));
    assert!(!is_valid_email("nada_neutho"));
    assert!(!is_valid_email("bobatan@[127.0.0.1]"));
    assert!(!is_valid_email("bobatan@127.0.0.1"));
  }

  #[test]
  fn test_is_valid_url() {
    assert!(is_valid_url("postgres://boba@localhost/boba", &["postgres", "postgresql"]));
    assert!(is_valid_url("redis://localhost:6379", &["redis", "rediss"]));
    assert!(!is_valid_url("mysql://localhost", &["postgres"]));
    assert!(!is_valid_url("not a url", &["postgres"]));
  }

  #[derive(Debug, thiserror::Error)]
  #[error("invalid")]
  struct Invalid;

  #[test]
  fn nested_violations_are_prefixed() {
    let mut inner = Violations::new();
    inner.check(false, "url", "Invalid Postgres connection URL");

    let mut violations = Violations::new();
    violations.check(true, "port", "unused");
    violations.nested("db.primary", inner);
    assert!(!violations.is_empty());

    let report = violations.into_result(Invalid).unwrap_err();
    assert!(format!("{report:?}").contains("db.primary.url: Invalid Postgres connection URL"));
  }

  #[test]
  fn no_violations_is_ok() {
    assert!(Violations::new().into_result(Invalid).is_ok());
  }
}
