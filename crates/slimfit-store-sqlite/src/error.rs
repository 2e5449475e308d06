//! Error type for `slimfit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The write would push the store past its configured size.
  #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
  QuotaExceeded { needed: usize, limit: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
