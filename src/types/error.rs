use serde::{Deserialize, Serialize};
use std::fmt::Display;
use utoipa::ToSchema;

/// Error returned to API clients. Only the variant (and an optional
/// message) ever leaves the server, the underlying report is logged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
  Internal,
  NotFound,
  ReadonlyMode,
  Unauthorized,
  Forbidden,
  BadRequest { message: String },
  Conflict { message: String },
}

impl Error {
  #[must_use]
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest {
      message: message.into(),
    }
  }

  #[must_use]
  pub fn conflict(message: impl Into<String>) -> Self {
    Self::Conflict {
      message: message.into(),
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::Internal => f.write_str("Failed to perform request"),
      Error::NotFound => f.write_str("Requested resource was not found"),
      Error::ReadonlyMode => f.write_str("Attempt to write read-only database"),
      Error::Unauthorized => f.write_str("Authentication required"),
      Error::Forbidden => f.write_str("Not allowed to perform this request"),
      Error::BadRequest { message } => write!(f, "Bad request: {message}"),
      Error::Conflict { message } => write!(f, "Conflict: {message}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_test::Token;

  #[track_caller]
  fn assert_unit_variant(value: Error, variant: &'static str) {
    serde_test::assert_tokens(
      &value,
      &[
        Token::Struct {
          name: "Error",
          len: 1,
        },
        Token::Str("type"),
        Token::Str(variant),
        Token::StructEnd,
      ],
    );
  }

  #[test]
  fn test_serde_impl() {
    assert_unit_variant(Error::Internal, "internal");
    assert_unit_variant(Error::NotFound, "not_found");
    assert_unit_variant(Error::ReadonlyMode, "readonly_mode");
    assert_unit_variant(Error::Unauthorized, "unauthorized");
    assert_unit_variant(Error::Forbidden, "forbidden");
  }

  #[test]
  fn test_message_variants() {
    let value = serde_json::to_value(Error::bad_request("no tags")).unwrap();
    assert_eq!(
      value,
      serde_json::json!({ "type": "bad_request", "message": "no tags" })
    );

    let value = serde_json::to_value(Error::conflict("already a member")).unwrap();
    assert_eq!(
      value,
      serde_json::json!({ "type": "conflict", "message": "already a member" })
    );
  }
}
