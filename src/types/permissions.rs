//! The permission vocabulary shared by realm roles, board roles and post or
//! thread ownership.
//!
//! There is exactly one list of permission tokens ([`Permission`]). Each
//! [`PermissionScope`] only names the subset it recognizes, in the order
//! used when permissions are reported back to clients.
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
  All,
  EditBoardDetails,
  PostAsRole,
  EditCategoryTags,
  EditContentNotices,
  MoveThread,
  EditContent,
  EditWhisperTags,
  EditIndexTags,
  EditDefaultView,
  CreateRealmInvite,
}

impl Permission {
  pub const VALUES: [Permission; 11] = [
    Permission::All,
    Permission::EditBoardDetails,
    Permission::PostAsRole,
    Permission::EditCategoryTags,
    Permission::EditContentNotices,
    Permission::MoveThread,
    Permission::EditContent,
    Permission::EditWhisperTags,
    Permission::EditIndexTags,
    Permission::EditDefaultView,
    Permission::CreateRealmInvite,
  ];

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Permission::All => "all",
      Permission::EditBoardDetails => "edit_board_details",
      Permission::PostAsRole => "post_as_role",
      Permission::EditCategoryTags => "edit_category_tags",
      Permission::EditContentNotices => "edit_content_notices",
      Permission::MoveThread => "move_thread",
      Permission::EditContent => "edit_content",
      Permission::EditWhisperTags => "edit_whisper_tags",
      Permission::EditIndexTags => "edit_index_tags",
      Permission::EditDefaultView => "edit_default_view",
      Permission::CreateRealmInvite => "create_realm_invite",
    }
  }
}

impl Display for Permission {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown permission {0:?}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
  type Err = UnknownPermission;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::VALUES
      .into_iter()
      .find(|v| v.as_str() == s)
      .ok_or_else(|| UnknownPermission(s.to_string()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionScope {
  Board,
  Post,
  Thread,
  Realm,
}

impl PermissionScope {
  /// Permissions recognized by this scope, in reporting order.
  #[must_use]
  pub const fn permissions(self) -> &'static [Permission] {
    match self {
      PermissionScope::Board => &[Permission::EditBoardDetails],
      PermissionScope::Post => &[
        Permission::EditContent,
        Permission::EditWhisperTags,
        Permission::EditCategoryTags,
        Permission::EditIndexTags,
        Permission::EditContentNotices,
      ],
      PermissionScope::Thread => &[Permission::EditDefaultView, Permission::MoveThread],
      PermissionScope::Realm => &[Permission::CreateRealmInvite],
    }
  }

  #[must_use]
  pub fn contains(self, permission: Permission) -> bool {
    self.permissions().contains(&permission)
  }
}

/// Every post owner gets these regardless of their roles.
pub const POST_OWNER_PERMISSIONS: [Permission; 4] = [
  Permission::EditCategoryTags,
  Permission::EditContentNotices,
  Permission::EditIndexTags,
  Permission::EditWhisperTags,
];

/// Every thread owner gets these regardless of their roles.
pub const THREAD_OWNER_PERMISSIONS: [Permission; 1] = [Permission::EditDefaultView];

/// Filters raw permission strings (as stored in role rows) down to the
/// ones recognized by `scope`.
///
/// The result follows the scope's order, not the input order, and never
/// contains duplicates. Unknown strings are ignored.
pub fn extract_permissions<S: AsRef<str>>(scope: PermissionScope, raw: &[S]) -> Vec<Permission> {
  scope
    .permissions()
    .iter()
    .copied()
    .filter(|permission| raw.iter().any(|v| v.as_ref() == permission.as_str()))
    .collect()
}

/// Whether a raw permission list grants `permission`, either directly or
/// through `all`.
pub fn has_permission<S: AsRef<str>>(raw: &[S], permission: Permission) -> bool {
  raw.iter().any(|v| {
    let v = v.as_ref();
    v == Permission::All.as_str() || v == permission.as_str()
  })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserBoardPermissions {
  pub board_permissions: Vec<Permission>,
  pub post_permissions: Vec<Permission>,
  pub thread_permissions: Vec<Permission>,
}

impl UserBoardPermissions {
  pub fn from_raw<S: AsRef<str>>(raw: &[S]) -> Self {
    Self {
      board_permissions: extract_permissions(PermissionScope::Board, raw),
      post_permissions: extract_permissions(PermissionScope::Post, raw),
      thread_permissions: extract_permissions(PermissionScope::Thread, raw),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn preserves_scope_order() {
    let raw = [
      "edit_index_tags",
      "edit_content",
      "move_thread",
      "edit_whisper_tags",
    ];
    assert_eq!(
      extract_permissions(PermissionScope::Post, &raw),
      vec![
        Permission::EditContent,
        Permission::EditWhisperTags,
        Permission::EditIndexTags,
      ]
    );
    assert_eq!(
      extract_permissions(PermissionScope::Thread, &raw),
      vec![Permission::MoveThread]
    );
    assert!(extract_permissions(PermissionScope::Board, &raw).is_empty());
  }

  #[test]
  fn ignores_unknown_and_duplicated_entries() {
    let raw = ["move_thread", "bake_cookies", "move_thread", "all"];
    assert_eq!(
      extract_permissions(PermissionScope::Thread, &raw),
      vec![Permission::MoveThread]
    );
  }

  #[test]
  fn all_only_grants_through_has_permission() {
    let raw = ["all"];
    assert!(extract_permissions(PermissionScope::Realm, &raw).is_empty());
    assert!(has_permission(&raw, Permission::CreateRealmInvite));
    assert!(!has_permission(&["edit_content"], Permission::CreateRealmInvite));
  }

  #[test]
  fn user_board_permissions_split_by_scope() {
    let raw = vec![
      "edit_default_view".to_string(),
      "edit_board_details".to_string(),
      "edit_content_notices".to_string(),
    ];
    let permissions = UserBoardPermissions::from_raw(&raw);
    assert_eq!(
      permissions.board_permissions,
      vec![Permission::EditBoardDetails]
    );
    assert_eq!(
      permissions.post_permissions,
      vec![Permission::EditContentNotices]
    );
    assert_eq!(
      permissions.thread_permissions,
      vec![Permission::EditDefaultView]
    );
  }

  #[test]
  fn string_round_trip() {
    for permission in Permission::VALUES {
      assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
      assert_eq!(
        serde_json::to_value(permission).unwrap(),
        serde_json::Value::String(permission.to_string())
      );
    }
    assert!("nope".parse::<Permission>().is_err());
  }

  #[test]
  fn owner_permissions_are_in_scope() {
    assert!(POST_OWNER_PERMISSIONS
      .iter()
      .all(|v| PermissionScope::Post.contains(*v)));
    assert!(THREAD_OWNER_PERMISSIONS
      .iter()
      .all(|v| PermissionScope::Thread.contains(*v)));
  }
}
