//! Second, independent pass over everything the projection produced.
//!
//! The check runs on the serialized JSON shape, which is exactly what a
//! client would receive, so it does not depend on how [`merge_identity`]
//! builds its structs.
//!
//! [`merge_identity`]: super::merge_identity
use error_stack::{Report, Result, ResultExt};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Identity leakage detected")]
pub struct LeakageError;

/// Top-level fields that only exist on raw rows.
pub const RAW_IDENTITY_FIELDS: [&str; 4] = ["author", "user_id", "username", "user_avatar"];

/// Fails if any object anywhere in `entity` exposes a real identity to a
/// viewer who is neither its author nor a friend, or still carries a raw
/// identity field.
///
/// Threads, posts, comments and search results are all walked to the
/// bottom, every nested object is checked.
#[tracing::instrument(skip_all, name = "projection.assert_no_leakage")]
pub fn assert_no_leakage<T: Serialize + ?Sized>(entity: &T) -> Result<(), LeakageError> {
  let value = serde_json::to_value(entity)
    .change_context(LeakageError)
    .attach_printable("could not serialize projected entity")?;

  let mut path = Vec::new();
  check_value(&value, &mut path)
}

fn check_value(value: &Value, path: &mut Vec<String>) -> Result<(), LeakageError> {
  match value {
    Value::Object(object) => {
      check_object(object, path)?;
      for (key, value) in object {
        path.push(key.clone());
        check_value(value, path)?;
        path.pop();
      }
    }
    Value::Array(items) => {
      for (index, value) in items.iter().enumerate() {
        path.push(index.to_string());
        check_value(value, path)?;
        path.pop();
      }
    }
    _ => {}
  }
  Ok(())
}

fn check_object(object: &Map<String, Value>, path: &[String]) -> Result<(), LeakageError> {
  let is_flag_set = |key: &str| object.get(key).and_then(Value::as_bool).unwrap_or(false);

  if object.contains_key("user_identity") && !is_flag_set("friend") && !is_flag_set("self") {
    return Err(Report::new(LeakageError).attach_printable(format!(
      "user identity exposed to a stranger at {:?}",
      path.join(".")
    )));
  }

  if let Some(field) = RAW_IDENTITY_FIELDS.iter().find(|f| object.contains_key(**f)) {
    return Err(Report::new(LeakageError).attach_printable(format!(
      "raw identity field {field:?} found at {:?}",
      path.join(".")
    )));
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::projection::post::tests::{comment, post, thread};
  use crate::projection::{make_post, make_thread};
  use serde_json::json;

  #[test]
  fn projected_threads_pass() {
    let source = thread(vec![
      post(false, false, Some(vec![comment("c1", false, false)])),
      post(true, false, Some(vec![comment("c2", false, true)])),
      post(false, true, None),
    ]);
    assert!(assert_no_leakage(&make_thread(&source)).is_ok());
  }

  #[test]
  fn catches_user_identity_for_strangers() {
    let mut projected = make_post(&post(true, false, None));
    projected.identity.friend = false;
    assert!(assert_no_leakage(&projected).is_err());
  }

  #[test]
  fn recurses_into_comments() {
    let mut projected = make_post(&post(false, false, Some(vec![comment("c1", true, false)])));
    assert!(assert_no_leakage(&projected).is_ok());

    if let Some(comments) = projected.comments.as_mut() {
      comments[0].identity.friend = false;
    }
    assert!(assert_no_leakage(&projected).is_err());
  }

  #[test]
  fn recurses_into_thread_posts() {
    let mut projected = make_thread(&thread(vec![
      post(false, false, None),
      post(false, true, None),
    ]));
    projected.posts[1].identity.self_ = false;
    assert!(assert_no_leakage(&projected).is_err());
  }

  #[test]
  fn catches_raw_identity_fields() {
    for field in RAW_IDENTITY_FIELDS {
      let value = json!({
        "post_id": "p",
        "friend": true,
        "self": true,
        "comments": [{ "comment_id": "c", field: 3 }],
      });
      assert!(assert_no_leakage(&value).is_err(), "{field} not caught");
    }
  }

  #[test]
  fn null_user_identity_still_counts_as_present() {
    let value = json!({ "friend": false, "self": false, "user_identity": null });
    assert!(assert_no_leakage(&value).is_err());
  }
}
