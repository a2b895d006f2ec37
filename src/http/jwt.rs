use error_stack::{Result, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Claims of a bearer token minted by the identity provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
  /// Identity provider id of the user, stored as `users.firebase_id`.
  pub sub: String,
  pub exp: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iss: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

#[derive(Debug, Error)]
#[error("Invalid bearer token")]
pub struct InvalidToken;

impl Claims {
  #[tracing::instrument(skip_all, name = "jwt.verify")]
  pub fn verify(token: &str, cfg: &config::Auth) -> Result<Self, InvalidToken> {
    let key = DecodingKey::from_secret(cfg.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = cfg.issuer.as_deref() {
      validation.set_issuer(&[issuer]);
      // `set_issuer` alone still accepts tokens without `iss`
      validation.set_required_spec_claims(&["exp", "iss"]);
    }

    let data = jsonwebtoken::decode::<Self>(token, &key, &validation).change_context(InvalidToken)?;
    Ok(data.claims)
  }
}
