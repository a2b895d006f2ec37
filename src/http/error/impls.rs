use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;

use super::Error;
use crate::{
  database::{self, ErrorExt2},
  projection::LeakageError,
  schema::EmptyIncludeTags,
  types::Error as ErrorType,
};

impl actix_web::ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self.error_type {
      ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      ErrorType::NotFound => StatusCode::NOT_FOUND,
      ErrorType::ReadonlyMode => StatusCode::SERVICE_UNAVAILABLE,
      ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
      ErrorType::Forbidden => StatusCode::FORBIDDEN,
      ErrorType::BadRequest { .. } => StatusCode::BAD_REQUEST,
      ErrorType::Conflict { .. } => StatusCode::CONFLICT,
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(error = ?self.report, trace = %self.trace, "{}", self.error_type);
    } else {
      tracing::debug!(error = ?self.report, "{}", self.error_type);
    }
    HttpResponse::build(status).json(&self.error_type)
  }
}

impl From<Report<database::Error>> for Error {
  fn from(value: Report<database::Error>) -> Self {
    if value.is_readonly() {
      Error::from_report(ErrorType::ReadonlyMode, value)
    } else {
      Error::from_report(ErrorType::Internal, value)
    }
  }
}

impl From<Report<LeakageError>> for Error {
  fn from(value: Report<LeakageError>) -> Self {
    Error::from_report(ErrorType::Internal, value)
  }
}

impl From<Report<EmptyIncludeTags>> for Error {
  fn from(value: Report<EmptyIncludeTags>) -> Self {
    let message = value.current_context().to_string();
    Error::from_report(ErrorType::bad_request(message), value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::ResponseError;

  #[test]
  fn readonly_database_is_unavailable() {
    let error = Error::from(Report::new(database::Error::Readonly));
    assert_eq!(error.as_type(), &ErrorType::ReadonlyMode);
    assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let error = Error::from(Report::new(database::Error::UnhealthyPool));
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn failed_invite_acceptance_is_internal() {
    let error = Error::from(database::ensure_single_row(0).unwrap_err());
    assert_eq!(error.as_type(), &ErrorType::Internal);
  }

  #[test]
  fn leakage_is_internal() {
    let error = Error::from(Report::new(LeakageError));
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn empty_tags_are_bad_requests() {
    let error = Error::from(Report::new(EmptyIncludeTags));
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    assert!(matches!(error.as_type(), ErrorType::BadRequest { .. }));
  }

  #[actix_web::test]
  async fn body_only_carries_the_type() {
    let error = Error::from_context(ErrorType::conflict("already a member"), LeakageError);
    let response = error.error_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
      value,
      serde_json::json!({ "type": "conflict", "message": "already a member" })
    );
  }
}
