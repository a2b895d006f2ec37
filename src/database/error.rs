use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
  /// The Postgres connection url of either the primary or the
  /// replica pool could not be parsed.
  #[error("invalid connection url")]
  InvalidUrl,
  /// An error caused by an [`sqlx`] error.
  #[error("received a pool error: {0}")]
  Internal(sqlx::Error),
  /// The database refused a write because the session is read-only
  /// (a replica, or the primary during maintenance).
  #[error("database is currently in read mode")]
  Readonly,
  /// Neither pool has a reliable connection to the database.
  #[error("unhealthy database pool")]
  UnhealthyPool,
  /// A statement that must change exactly one row changed none or
  /// several. The surrounding transaction must not be committed.
  #[error("statement affected {0} rows instead of one")]
  RowCount(u64),
}

/// Fails with [`Error::RowCount`] unless exactly one row was affected.
pub fn ensure_single_row(rows_affected: u64) -> Result<()> {
  if rows_affected == 1 {
    Ok(())
  } else {
    Err(Report::new(Error::RowCount(rows_affected)))
  }
}

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
  fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
  fn into_db_error(self) -> Result<T> {
    self.map_err(|e| match &e {
      sqlx::Error::Database(err) if err.message().ends_with("read-only transaction") => {
        Report::new(e).change_context(Error::Readonly)
      }
      _ => Report::new(Error::Internal(e)),
    })
  }
}

pub type Result<T> = error_stack::Result<T, Error>;

/// Checks on the current context of a `Report<Error>` without having
/// to downcast at every call site.
pub trait ErrorExt2 {
  fn is_unhealthy(&self) -> bool;
  fn is_readonly(&self) -> bool;
}

impl ErrorExt2 for Report<Error> {
  fn is_unhealthy(&self) -> bool {
    matches!(self.current_context(), Error::UnhealthyPool)
  }

  fn is_readonly(&self) -> bool {
    matches!(self.current_context(), Error::Readonly)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_not_found_is_internal() {
    let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
    let report = result.into_db_error().unwrap_err();
    assert!(matches!(report.current_context(), Error::Internal(..)));
    assert!(!report.is_readonly());
    assert!(!report.is_unhealthy());
  }

  #[test]
  fn single_row_guard() {
    assert!(ensure_single_row(1).is_ok());
    for count in [0, 2] {
      let report = ensure_single_row(count).unwrap_err();
      assert!(matches!(report.current_context(), Error::RowCount(n) if *n == count));
    }
  }

  #[test]
  fn checks_current_context() {
    assert!(Report::new(Error::UnhealthyPool).is_unhealthy());
    assert!(Report::new(Error::Readonly).is_readonly());
  }
}
