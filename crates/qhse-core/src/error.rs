//! Error types for `qhse-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field `{field}` for {resource}")]
  MissingField {
    resource: &'static str,
    field:    &'static str,
  },

  #[error("field `{field}` for {resource} must be {expected}")]
  InvalidField {
    resource: &'static str,
    field:    &'static str,
    expected: &'static str,
  },

  #[error("field `{field}` for {resource} must be an array of objects")]
  InvalidChildRow {
    resource: &'static str,
    field:    &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
