//! Error type for `qhse-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] qhse_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
