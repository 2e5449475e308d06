//! Team presence and chat synchronisation over a publish/subscribe transport.
//!
//! [`TeamChannel`] owns the connection for one team and turns raw transport
//! deliveries into typed [`Inbound`] messages. The transport itself is an
//! injected [`Transport`]; [`MemoryBroker`] provides an in-process one with
//! retained-message semantics.

#![allow(async_fn_in_trait)]

pub mod channel;
pub mod error;
pub mod memory;
pub mod topic;
pub mod transport;
pub mod wire;

pub use channel::TeamChannel;
pub use error::{Error, Result};
pub use memory::{MemoryBroker, MemoryTransport};
pub use transport::{ConnectOptions, Transport, TransportEvent, TransportSettings};
pub use wire::Inbound;
