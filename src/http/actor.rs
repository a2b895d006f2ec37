use actix_web::{http::header, web, FromRequest};
use futures::future::{ready, Ready};
use thiserror::Error;

use super::{jwt::Claims, Error};
use crate::{config, types, App};

/// Whoever sent the request.
///
/// A request without an `Authorization` header is anonymous. A header
/// with an invalid token is rejected instead of silently downgraded.
#[derive(Debug, Clone)]
pub enum Actor {
  Anonymous,
  User(Viewer),
}

#[derive(Debug, Clone)]
pub struct Viewer {
  pub firebase_id: String,
  pub email: Option<String>,
}

impl Actor {
  #[must_use]
  pub fn firebase_id(&self) -> Option<&str> {
    match self {
      Self::User(viewer) => Some(viewer.firebase_id.as_str()),
      Self::Anonymous => None,
    }
  }

  #[must_use]
  pub fn is_logged_in(&self) -> bool {
    matches!(self, Self::User(..))
  }

  pub fn get_user(self) -> Result<Viewer, Error> {
    #[derive(Debug, Error)]
    #[error("Attempt to access user-only route")]
    struct Unauthorized;
    match self {
      Self::User(n) => Ok(n),
      Self::Anonymous => Err(Error::from_context(types::Error::Unauthorized, Unauthorized)),
    }
  }

  fn from_header(
    value: Option<&header::HeaderValue>,
    auth: Option<&config::Auth>,
  ) -> Result<Self, Error> {
    let Some(value) = value else {
      return Ok(Self::Anonymous);
    };

    let token = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Bearer "))
      .ok_or_else(|| Error::from_context(types::Error::Unauthorized, MalformedHeader))?;

    let Some(auth) = auth else {
      #[derive(Debug, Error)]
      #[error("The web app has no available configuration")]
      struct NoConfig;
      return Err(Error::from_context(types::Error::Internal, NoConfig));
    };

    let claims = Claims::verify(token, auth)
      .map_err(|e| Error::from_report(types::Error::Unauthorized, e))?;

    Ok(Self::User(Viewer {
      firebase_id: claims.sub,
      email: claims.email,
    }))
  }
}

#[derive(Debug, Error)]
#[error("Authorization header is not a bearer token")]
struct MalformedHeader;

impl FromRequest for Actor {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(
    req: &actix_web::HttpRequest,
    _payload: &mut actix_web::dev::Payload,
  ) -> Self::Future {
    let auth = req.app_data::<web::Data<App>>().map(|app| &app.config.auth);
    ready(Self::from_header(req.headers().get(header::AUTHORIZATION), auth))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::jwt::tests::{auth, token, SECRET};
  use header::HeaderValue;

  fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
  }

  #[test]
  fn no_header_is_anonymous() {
    let actor = Actor::from_header(None, Some(&auth(None))).unwrap();
    assert!(!actor.is_logged_in());
    assert!(actor.get_user().is_err());
  }

  #[test]
  fn valid_token_is_a_user() {
    let header = bearer(&token("c6HimTlg2RhVH3fC1psXZORdLcx2", 3600, None, SECRET));
    let actor = Actor::from_header(Some(&header), Some(&auth(None))).unwrap();
    assert_eq!(actor.firebase_id(), Some("c6HimTlg2RhVH3fC1psXZORdLcx2"));
  }

  #[test]
  fn invalid_tokens_are_unauthorized() {
    let expired = bearer(&token("user", -3600, None, SECRET));
    let malformed = HeaderValue::from_static("Basic Ym9iYTp0ZWE=");

    for header in [expired, malformed] {
      let error = Actor::from_header(Some(&header), Some(&auth(None))).unwrap_err();
      assert_eq!(error.as_type(), &types::Error::Unauthorized);
    }
  }
}
