//! The SlimFit engine: one explicit state object over the core logic.
//!
//! [`Engine`] owns the profile, the log history, the chat history, the team
//! roster and the live team channel. Every operation mutates the in-memory
//! model first and then writes the affected keys to the injected
//! [`KeyValueStore`](slimfit_core::store::KeyValueStore). Persistence and
//! transport failures are logged and never abort an operation.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{CheckInReport, Engine, Penalty};
pub use error::{Error, Result};
