//! The publish/subscribe transport collaborator.
//!
//! A transport delivers everything it receives, connection state changes
//! included, on the event receiver returned by [`Transport::connect`]. After
//! a transient failure it reconnects on its own on a fixed interval and
//! reports [`TransportEvent::Connected`] again; with a clean session its
//! subscriptions are gone at that point and must be re-established.

use std::{future::Future, time::Duration};

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Connection settings, deserialised from the `[engine.transport]` config
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
  pub endpoint:              String,
  pub keep_alive_secs:       u64,
  pub reconnect_interval_ms: u64,
  pub clean_session:         bool,
  /// Leading part of every client id.
  pub client_prefix:         String,
}

impl Default for TransportSettings {
  fn default() -> Self {
    Self {
      endpoint:              "wss://broker.emqx.io:8084/mqtt".to_string(),
      keep_alive_secs:       60,
      reconnect_interval_ms: 1000,
      clean_session:         true,
      client_prefix:         "slimfit".to_string(),
    }
  }
}

/// Parameters for a single [`Transport::connect`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
  pub endpoint:           String,
  pub client_id:          String,
  pub keep_alive:         Duration,
  pub clean_session:      bool,
  pub reconnect_interval: Duration,
}

impl ConnectOptions {
  /// Options for `user_id`'s session. The client id embeds the current time
  /// so that several devices or processes of the same member never take over
  /// each other's broker session.
  pub fn for_member(settings: &TransportSettings, user_id: Uuid) -> Self {
    Self {
      endpoint:           settings.endpoint.clone(),
      client_id:          format!(
        "{}_{}_{}",
        settings.client_prefix,
        user_id.simple(),
        Utc::now().timestamp_millis()
      ),
      keep_alive:         Duration::from_secs(settings.keep_alive_secs),
      clean_session:      settings.clean_session,
      reconnect_interval: Duration::from_millis(settings.reconnect_interval_ms),
    }
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
  /// The session is up, either for the first time or after a reconnect.
  Connected,
  /// The session dropped; a reconnect is pending.
  Disconnected,
  Message { topic: String, payload: Vec<u8> },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a publish/subscribe broker connection.
pub trait Transport: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Open a session. The returned receiver yields every subsequent event for
  /// this session until [`Transport::disconnect`] is called.
  fn connect(
    &mut self,
    options: ConnectOptions,
  ) -> impl Future<Output = Result<mpsc::UnboundedReceiver<TransportEvent>, Self::Error>> + Send + '_;

  /// Subscribe to a topic pattern. Retained messages matching the pattern are
  /// delivered immediately.
  fn subscribe<'a>(
    &'a mut self,
    pattern: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Publish `payload` on `topic`. With `retain`, the broker keeps it as the
  /// topic's last known message for future subscribers.
  fn publish<'a>(
    &'a mut self,
    topic: &'a str,
    payload: Vec<u8>,
    retain: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// End the session. Anything still in flight may be lost.
  fn disconnect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_ids_embed_member_and_differ_per_session() {
    let settings = TransportSettings::default();
    let user = Uuid::new_v4();
    let a = ConnectOptions::for_member(&settings, user);
    std::thread::sleep(Duration::from_millis(2));
    let b = ConnectOptions::for_member(&settings, user);

    assert!(a.client_id.starts_with(&format!("slimfit_{}_", user.simple())));
    assert_ne!(a.client_id, b.client_id);
    assert_eq!(a.keep_alive, Duration::from_secs(60));
    assert_eq!(a.reconnect_interval, Duration::from_millis(1000));
    assert!(a.clean_session);
  }
}
