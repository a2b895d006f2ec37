use serde::Deserialize;

use crate::util::validation::Violations;

/// Bearer tokens are minted by the identity provider, this server only
/// verifies them.
#[derive(Deserialize)]
pub struct Auth {
  /// HS256 shared secret.
  ///
  /// **Environment variables**:
  /// - `BOBA_AUTH_JWT_SECRET`
  pub jwt_secret: String,
  /// Expected `iss` claim, not checked when unset.
  ///
  /// **Environment variables**:
  /// - `BOBA_AUTH_ISSUER`
  pub issuer: Option<String>,
}

impl std::fmt::Debug for Auth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Auth")
      .field("jwt_secret", &"<hidden>")
      .field("issuer", &self.issuer)
      .finish()
  }
}

impl Auth {
  const JWT_SECRET_LENGTH: std::ops::RangeInclusive<usize> = 12..=1024;

  pub(crate) fn validate(&self) -> Violations {
    let mut violations = Violations::new();
    violations.check(
      Self::JWT_SECRET_LENGTH.contains(&self.jwt_secret.len()),
      "jwt_secret",
      "Invalid JWT secret key",
    );
    violations
  }
}
