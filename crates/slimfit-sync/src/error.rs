//! Error types for `slimfit-sync`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("not connected to the team channel")]
  NotConnected,

  #[error("could not encode payload: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("could not decode payload on {topic}: {source}")]
  Decode {
    topic:  String,
    #[source]
    source: serde_json::Error,
  },
}

impl Error {
  pub(crate) fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Transport(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
