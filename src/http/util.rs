use actix_web::{web, HttpResponse};
use thiserror::Error;

use super::Error;
use crate::types;

/// Renders malformed JSON bodies as `bad_request` errors instead of
/// actix's plain text responses.
#[must_use]
pub fn json_config() -> web::JsonConfig {
  #[derive(Debug, Error)]
  #[error("Invalid JSON payload")]
  struct InvalidPayload;

  web::JsonConfig::default().error_handler(|err, _req| {
    Error::from_context(types::Error::bad_request(err.to_string()), InvalidPayload).into()
  })
}

/// Fallback for every unknown route.
pub async fn not_found() -> Result<HttpResponse, Error> {
  #[derive(Debug, Error)]
  #[error("No route matched")]
  struct NoRoute;
  Err(Error::from_context(types::Error::NotFound, NoRoute))
}
