//! Core types and pure logic for the SlimFit progress and team sync engine.
//!
//! Nothing here touches a database, a transport or an async runtime. The
//! trajectory, check-in rules and the two reconcilers are plain functions
//! over owned data; persistence is reached only through the
//! [`store::KeyValueStore`] trait.

// Trait methods return `impl Future + Send` explicitly; impls use `async fn`.
#![allow(async_fn_in_trait)]

pub mod chat;
pub mod checkin;
pub mod error;
pub mod log;
pub mod plan;
pub mod presence;
pub mod progress;
pub mod profile;
pub mod store;
pub mod team;
pub mod trajectory;

pub use error::{Error, Result};
