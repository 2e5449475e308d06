//! [`TeamChannel`]: the connection lifecycle for one team.
//!
//! On every (re)connect the channel subscribes to both team topics and
//! re-publishes the member's own presence snapshot, so late joiners see it
//! without waiting for the next state change. Deliveries that fail to decode
//! are logged and dropped; they never stop the channel.

use chrono::Utc;
use slimfit_core::{chat::ChatMessage, presence::Teammate, team::TeamCode};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
  Error, Result,
  topic::TeamTopics,
  transport::{ConnectOptions, Transport, TransportEvent},
  wire::{self, Inbound},
};

pub struct TeamChannel<T: Transport> {
  transport: T,
  team:      TeamCode,
  topics:    TeamTopics,
  client_id: String,
  events:    mpsc::UnboundedReceiver<TransportEvent>,
  presence:  Teammate,
  connected: bool,
}

impl<T: Transport> TeamChannel<T> {
  /// Connect `transport` to `team` and wait for the session to come up,
  /// riding out any disconnects the transport reports before it does.
  /// `presence` is this member's current snapshot, published once connected.
  pub async fn open(
    mut transport: T,
    team: TeamCode,
    options: ConnectOptions,
    presence: Teammate,
  ) -> Result<Self> {
    let client_id = options.client_id.clone();
    debug!(team = %team, client_id = %client_id, endpoint = %options.endpoint, "connecting");
    let events = transport.connect(options).await.map_err(Error::transport)?;

    let mut channel = Self {
      transport,
      topics: TeamTopics::new(&team),
      team,
      client_id,
      events,
      presence,
      connected: false,
    };

    // A drop before the first session comes up is still transient; only a
    // closed event stream means the transport gave up.
    loop {
      match channel.events.recv().await {
        Some(TransportEvent::Connected) => {
          channel.on_connected().await;
          return Ok(channel);
        }
        Some(TransportEvent::Disconnected) => {
          debug!(team = %channel.team, "dropped before first connect; waiting for reconnect");
        }
        Some(TransportEvent::Message { topic, .. }) => {
          debug!(team = %channel.team, topic = %topic, "ignoring delivery before connect");
        }
        None => {
          channel.close().await;
          return Err(Error::NotConnected);
        }
      }
    }
  }

  pub fn team(&self) -> &TeamCode { &self.team }

  pub fn client_id(&self) -> &str { &self.client_id }

  pub fn is_connected(&self) -> bool { self.connected }

  /// Replace this member's snapshot and publish it. While disconnected the
  /// snapshot is kept and goes out on the next reconnect.
  pub async fn publish_presence(&mut self, snapshot: Teammate) -> Result<()> {
    self.presence = snapshot;
    if !self.connected {
      debug!(team = %self.team, "offline; presence deferred to reconnect");
      return Ok(());
    }
    self.send_presence().await
  }

  /// Publish a chat message. Delivery is not confirmed; a message sent while
  /// disconnected is lost.
  pub async fn publish_chat(&mut self, message: &ChatMessage) -> Result<()> {
    if !self.connected {
      return Err(Error::NotConnected);
    }
    let payload = wire::encode_chat(message)?;
    self
      .transport
      .publish(&self.topics.chat, payload, false)
      .await
      .map_err(Error::transport)?;
    debug!(team = %self.team, id = %message.id, "chat published");
    Ok(())
  }

  /// Wait for the next decoded delivery. Connection state changes are
  /// handled internally. Returns `None` once the transport closes the event
  /// stream.
  pub async fn next_message(&mut self) -> Option<Inbound> {
    loop {
      match self.events.recv().await? {
        TransportEvent::Connected => self.on_connected().await,
        TransportEvent::Disconnected => {
          debug!(team = %self.team, "disconnected; waiting for reconnect");
          self.connected = false;
        }
        TransportEvent::Message { topic, payload } => {
          match wire::decode(&self.topics, &topic, &payload) {
            Ok(Some(inbound)) => return Some(inbound),
            Ok(None) => {}
            Err(e) => warn!(team = %self.team, error = %e, "dropping malformed payload"),
          }
        }
      }
    }
  }

  /// Tear the connection down. Anything still in flight may be dropped.
  pub async fn close(mut self) {
    if let Err(e) = self.transport.disconnect().await {
      warn!(team = %self.team, error = %e, "disconnect failed");
    }
    debug!(team = %self.team, "channel closed");
  }

  async fn on_connected(&mut self) {
    self.connected = true;
    for pattern in [self.topics.presence.clone(), self.topics.chat.clone()] {
      if let Err(e) = self.transport.subscribe(&pattern).await {
        warn!(team = %self.team, topic = %pattern, error = %e, "subscribe failed");
      }
    }
    debug!(team = %self.team, "subscribed");
    if let Err(e) = self.send_presence().await {
      warn!(team = %self.team, error = %e, "presence publish failed");
    }
  }

  async fn send_presence(&mut self) -> Result<()> {
    self.presence.last_seen = Utc::now().timestamp_millis();
    let payload = wire::encode_presence(&self.presence)?;
    self
      .transport
      .publish(&self.topics.presence, payload, true)
      .await
      .map_err(Error::transport)
  }
}
