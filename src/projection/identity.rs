use serde::Serialize;
use utoipa::ToSchema;

use crate::models::AuthorIdentity;

const URL_SCHEMES: [&str; 2] = ["https://", "http://"];

/// Turns a stored image reference into something a client can load.
///
/// Full URLs are passed through, everything else is a storage
/// reference and becomes a root-relative path. Empty references stay
/// empty.
#[must_use]
pub fn resolve_image_url(reference: &str) -> String {
  if reference.is_empty() || URL_SCHEMES.iter().any(|s| reference.starts_with(s)) {
    reference.to_string()
  } else {
    format!("/{reference}")
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SecretIdentity {
  pub name: String,
  pub avatar: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub accessory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserIdentity {
  pub name: String,
  pub avatar: String,
}

/// Identity fields of a projected post or comment.
///
/// `user_identity` is `None` (and therefore absent from the JSON body, not
/// `null`) unless the viewer is the author or one of their friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectedIdentity {
  pub secret_identity: SecretIdentity,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_identity: Option<UserIdentity>,
  pub friend: bool,
  #[serde(rename = "self")]
  pub self_: bool,
}

/// Replaces the raw author columns of a row with the nested identity
/// objects a viewer is allowed to see.
pub fn merge_identity(identity: &AuthorIdentity) -> ProjectedIdentity {
  let user_identity = identity.is_visible_to_viewer().then(|| UserIdentity {
    name: identity.username.clone(),
    avatar: resolve_image_url(&identity.user_avatar),
  });

  ProjectedIdentity {
    secret_identity: SecretIdentity {
      name: identity.secret_identity_name.clone(),
      avatar: resolve_image_url(&identity.secret_identity_avatar),
      color: identity.secret_identity_color.clone(),
      accessory: identity.accessory_avatar.clone(),
    },
    user_identity,
    friend: identity.friend,
    self_: identity.self_,
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn identity(friend: bool, self_: bool) -> AuthorIdentity {
    AuthorIdentity {
      author: 3,
      username: "oncest5evah".into(),
      user_avatar: "greedler.jpg".into(),
      secret_identity_name: "Old Time-y Anon".into(),
      secret_identity_avatar: "https://cdn.example.com/anon.png".into(),
      secret_identity_color: Some("#f96680".into()),
      accessory_avatar: None,
      friend,
      self_,
    }
  }

  #[test]
  fn resolves_image_urls() {
    assert_eq!(resolve_image_url("avatar.png"), "/avatar.png");
    assert_eq!(
      resolve_image_url("https://cdn.example.com/a.png"),
      "https://cdn.example.com/a.png"
    );
    assert_eq!(
      resolve_image_url("http://localhost:4200/a.png"),
      "http://localhost:4200/a.png"
    );
    assert_eq!(resolve_image_url(""), "");
  }

  #[test]
  fn strangers_only_get_the_secret_identity() {
    let merged = merge_identity(&identity(false, false));
    assert!(merged.user_identity.is_none());
    assert_eq!(merged.secret_identity.name, "Old Time-y Anon");
    assert_eq!(
      merged.secret_identity.avatar,
      "https://cdn.example.com/anon.png"
    );
    assert_eq!(merged.secret_identity.color.as_deref(), Some("#f96680"));

    let value = serde_json::to_value(&merged).unwrap();
    let object = value.as_object().unwrap();
    assert!(!object.contains_key("user_identity"));
    assert!(!object["secret_identity"]
      .as_object()
      .unwrap()
      .contains_key("accessory"));
  }

  #[test]
  fn author_sees_their_own_identity() {
    let merged = merge_identity(&identity(false, true));
    let user = merged.user_identity.unwrap();
    assert_eq!(user.name, "oncest5evah");
    assert_eq!(user.avatar, "/greedler.jpg");
  }

  #[test]
  fn friends_see_the_real_identity() {
    let merged = merge_identity(&identity(true, false));
    assert!(merged.user_identity.is_some());
    assert!(merged.friend);
    assert!(!merged.self_);

    let value = serde_json::to_value(&merged).unwrap();
    assert_eq!(value["self"], serde_json::Value::Bool(false));
    assert_eq!(value["user_identity"]["name"], "oncest5evah");
  }
}
