//! An in-process broker with retained messages and clean sessions.
//!
//! Every [`MemoryTransport`] obtained from the same [`MemoryBroker`] shares
//! its topics, so several team members can be simulated inside one process.
//! Deliveries are at-least-once fan-out to every matching subscription,
//! including the publisher's own.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
  topic::matches,
  transport::{ConnectOptions, Transport, TransportEvent},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("no live session for this transport")]
  NotConnected,
}

struct Session {
  tx:                 mpsc::UnboundedSender<TransportEvent>,
  subscriptions:      Vec<String>,
  online:             bool,
  reconnect_interval: Duration,
}

impl Session {
  fn send(&self, event: TransportEvent) {
    // A dropped receiver just means nobody is listening any more.
    let _ = self.tx.send(event);
  }
}

#[derive(Default)]
struct BrokerState {
  retained: HashMap<String, Vec<u8>>,
  sessions: HashMap<String, Session>,
}

impl BrokerState {
  fn publish(&mut self, topic: &str, payload: Vec<u8>, retain: bool) {
    for session in self.sessions.values().filter(|s| s.online) {
      if session.subscriptions.iter().any(|p| matches(p, topic)) {
        session.send(TransportEvent::Message {
          topic:   topic.to_string(),
          payload: payload.clone(),
        });
      }
    }
    if retain {
      if payload.is_empty() {
        self.retained.remove(topic);
      } else {
        self.retained.insert(topic.to_string(), payload);
      }
    }
  }
}

// ─── Broker ──────────────────────────────────────────────────────────────────

/// Shared broker state. Cloning is cheap and yields a handle to the same
/// broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
  state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
  pub fn new() -> Self { Self::default() }

  fn state(&self) -> MutexGuard<'_, BrokerState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// A new, unconnected client of this broker.
  pub fn transport(&self) -> MemoryTransport {
    MemoryTransport {
      broker:    self.clone(),
      client_id: None,
    }
  }

  /// Publish from outside any session, e.g. to inject raw payloads.
  pub fn inject(&self, topic: &str, payload: impl Into<Vec<u8>>, retain: bool) {
    self.state().publish(topic, payload.into(), retain);
  }

  /// The retained message on `topic`, if any.
  pub fn retained(&self, topic: &str) -> Option<Vec<u8>> { self.state().retained.get(topic).cloned() }

  /// Number of registered sessions, online or waiting to reconnect.
  pub fn session_count(&self) -> usize { self.state().sessions.len() }

  /// Drop `client_id`'s connection as a network failure would. The session
  /// loses its subscriptions and comes back online after its reconnect
  /// interval. Must be called from within a tokio runtime.
  pub fn interrupt(&self, client_id: &str) -> bool {
    let interval = {
      let mut state = self.state();
      let Some(session) = state.sessions.get_mut(client_id) else {
        return false;
      };
      session.online = false;
      session.subscriptions.clear();
      session.send(TransportEvent::Disconnected);
      session.reconnect_interval
    };

    let broker = self.clone();
    let client_id = client_id.to_string();
    tokio::spawn(async move {
      tokio::time::sleep(interval).await;
      let mut state = broker.state();
      if let Some(session) = state.sessions.get_mut(&client_id)
        && !session.online
      {
        session.online = true;
        session.send(TransportEvent::Connected);
      }
    });
    true
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// One client connection to a [`MemoryBroker`].
pub struct MemoryTransport {
  broker:    MemoryBroker,
  client_id: Option<String>,
}

impl MemoryTransport {
  pub fn client_id(&self) -> Option<&str> { self.client_id.as_deref() }

  fn with_session<T>(
    &self,
    f: impl FnOnce(&mut BrokerState, &str) -> T,
  ) -> Result<T, MemoryError> {
    let client_id = self.client_id.as_deref().ok_or(MemoryError::NotConnected)?;
    let mut state = self.broker.state();
    match state.sessions.get(client_id) {
      Some(session) if session.online => Ok(f(&mut state, client_id)),
      _ => Err(MemoryError::NotConnected),
    }
  }
}

impl Transport for MemoryTransport {
  type Error = MemoryError;

  async fn connect(
    &mut self,
    options: ConnectOptions,
  ) -> Result<mpsc::UnboundedReceiver<TransportEvent>, MemoryError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut state = self.broker.state();

    // A second connection with the same id takes the session over.
    if let Some(previous) = state.sessions.remove(&options.client_id) {
      previous.send(TransportEvent::Disconnected);
    }

    let session = Session {
      tx,
      subscriptions: Vec::new(),
      online: true,
      reconnect_interval: options.reconnect_interval,
    };
    session.send(TransportEvent::Connected);
    state.sessions.insert(options.client_id.clone(), session);
    drop(state);

    self.client_id = Some(options.client_id);
    Ok(rx)
  }

  async fn subscribe(&mut self, pattern: &str) -> Result<(), MemoryError> {
    self.with_session(|state, client_id| {
      let retained: Vec<_> = state
        .retained
        .iter()
        .filter(|(topic, _)| matches(pattern, topic))
        .map(|(topic, payload)| (topic.clone(), payload.clone()))
        .collect();

      if let Some(session) = state.sessions.get_mut(client_id) {
        session.subscriptions.push(pattern.to_string());
        for (topic, payload) in retained {
          session.send(TransportEvent::Message { topic, payload });
        }
      }
    })
  }

  async fn publish(&mut self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), MemoryError> {
    self.with_session(|state, _| state.publish(topic, payload, retain))
  }

  async fn disconnect(&mut self) -> Result<(), MemoryError> {
    if let Some(client_id) = self.client_id.take() {
      self.broker.state().sessions.remove(&client_id);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(client_id: &str) -> ConnectOptions {
    ConnectOptions {
      endpoint:           "memory".into(),
      client_id:          client_id.into(),
      keep_alive:         Duration::from_secs(60),
      clean_session:      true,
      reconnect_interval: Duration::from_millis(10),
    }
  }

  fn message(event: TransportEvent) -> (String, Vec<u8>) {
    match event {
      TransportEvent::Message { topic, payload } => (topic, payload),
      other => panic!("expected message, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn retained_message_is_replayed_to_late_subscriber() {
    let broker = MemoryBroker::new();
    let mut early = broker.transport();
    early.connect(options("early")).await.unwrap();
    early.publish("team/A/presence", b"one".to_vec(), true).await.unwrap();
    early.publish("team/A/presence", b"two".to_vec(), true).await.unwrap();
    early.publish("team/A/chat", b"not kept".to_vec(), false).await.unwrap();

    let mut late = broker.transport();
    let mut rx = late.connect(options("late")).await.unwrap();
    assert_eq!(rx.recv().await, Some(TransportEvent::Connected));
    late.subscribe("team/A/#").await.unwrap();

    let (topic, payload) = message(rx.recv().await.unwrap());
    assert_eq!(topic, "team/A/presence");
    assert_eq!(payload, b"two");
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn publish_fans_out_to_matching_subscribers_including_self() {
    let broker = MemoryBroker::new();
    let mut a = broker.transport();
    let mut b = broker.transport();
    let mut rx_a = a.connect(options("a")).await.unwrap();
    let mut rx_b = b.connect(options("b")).await.unwrap();
    rx_a.recv().await;
    rx_b.recv().await;
    a.subscribe("team/A/chat").await.unwrap();
    b.subscribe("team/B/chat").await.unwrap();

    a.publish("team/A/chat", b"hi".to_vec(), false).await.unwrap();
    assert_eq!(message(rx_a.recv().await.unwrap()).1, b"hi");
    assert!(rx_b.try_recv().is_err());
  }

  #[tokio::test]
  async fn empty_retained_payload_clears_topic() {
    let broker = MemoryBroker::new();
    broker.inject("t", b"x".to_vec(), true);
    assert!(broker.retained("t").is_some());
    broker.inject("t", Vec::new(), true);
    assert!(broker.retained("t").is_none());
  }

  #[tokio::test]
  async fn interrupt_drops_subscriptions_then_reconnects() {
    let broker = MemoryBroker::new();
    let mut t = broker.transport();
    let mut rx = t.connect(options("c")).await.unwrap();
    assert_eq!(rx.recv().await, Some(TransportEvent::Connected));
    t.subscribe("team/A/chat").await.unwrap();

    assert!(broker.interrupt("c"));
    assert_eq!(rx.recv().await, Some(TransportEvent::Disconnected));
    assert!(matches!(
      t.publish("team/A/chat", b"lost".to_vec(), false).await,
      Err(MemoryError::NotConnected)
    ));

    assert_eq!(rx.recv().await, Some(TransportEvent::Connected));
    broker.inject("team/A/chat", b"unsubscribed".to_vec(), false);
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn same_client_id_takes_over_session() {
    let broker = MemoryBroker::new();
    let mut first = broker.transport();
    let mut rx_first = first.connect(options("dup")).await.unwrap();
    rx_first.recv().await;

    let mut second = broker.transport();
    second.connect(options("dup")).await.unwrap();
    assert_eq!(rx_first.recv().await, Some(TransportEvent::Disconnected));
    assert_eq!(broker.session_count(), 1);
  }

  #[tokio::test]
  async fn disconnect_removes_session() {
    let broker = MemoryBroker::new();
    let mut t = broker.transport();
    t.connect(options("gone")).await.unwrap();
    t.disconnect().await.unwrap();
    assert_eq!(broker.session_count(), 0);
    assert!(t.subscribe("x").await.is_err());
  }
}
