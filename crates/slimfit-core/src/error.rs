//! Error types for `slimfit-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("weight must be a positive number, got {0}")]
  InvalidWeight(f64),

  #[error("profile field is missing or out of range: {0}")]
  IncompleteProfile(&'static str),

  #[error("invalid team code: {0:?}")]
  InvalidTeamCode(String),

  #[error("a reflection reason is required before submitting")]
  ReflectionRequired,

  #[error("check-in is not in a state that accepts this step")]
  InvalidCheckInState,

  #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
  QuotaExceeded { needed: usize, limit: usize },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
