use super::{Error, Result};
use crate::types;

use error_stack::Context;

/// Turns a missing row into a `not_found` error.
pub trait OptionExt<T> {
  fn or_not_found(self, context: impl Context) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
  fn or_not_found(self, context: impl Context) -> Result<T> {
    self.ok_or_else(|| Error::from_context(types::Error::NotFound, context))
  }
}
