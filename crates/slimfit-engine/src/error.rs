//! Error types for `slimfit-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no profile yet; onboard first")]
  NotOnboarded,

  #[error("not a member of any team")]
  NoTeam,

  #[error("no live team channel")]
  NotConnected,

  #[error(transparent)]
  Core(#[from] slimfit_core::Error),

  #[error(transparent)]
  Sync(#[from] slimfit_sync::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
