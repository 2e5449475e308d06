//! Team chat messages and the local history they are merged into.
//!
//! History is append-only in receipt order. A message whose id is already
//! present is dropped, which makes redelivery after a reconnect harmless.
//! Timestamps come from the sender's clock and are never used for ordering.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages kept when the history is persisted.
pub const DEFAULT_WINDOW: usize = 50;

/// Display name used for system notifications.
pub const SYSTEM_NAME: &str = "System";

const SYSTEM_SENDER: &str = "system";

// ─── Message ─────────────────────────────────────────────────────────────────

/// Who wrote a message: a member, or the `system` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sender {
  System,
  Member(Uuid),
}

impl TryFrom<String> for Sender {
  type Error = uuid::Error;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    if value == SYSTEM_SENDER {
      return Ok(Self::System);
    }
    Uuid::parse_str(&value).map(Self::Member)
  }
}

impl From<Sender> for String {
  fn from(sender: Sender) -> Self {
    match sender {
      Sender::System => SYSTEM_SENDER.to_string(),
      Sender::Member(id) => id.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
  Text,
  System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  /// Globally unique.
  pub id:        String,
  pub user_id:   Sender,
  pub user_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar:    Option<String>,
  pub content:   String,
  /// Epoch milliseconds on the sender's clock.
  pub timestamp: i64,
  #[serde(rename = "type")]
  pub kind:      MessageKind,
}

impl ChatMessage {
  /// A member's text message with a fresh id.
  pub fn text(
    user_id: Uuid,
    user_name: impl Into<String>,
    avatar: Option<String>,
    content: impl Into<String>,
    timestamp: i64,
  ) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: Sender::Member(user_id),
      user_name: user_name.into(),
      avatar,
      content: content.into(),
      timestamp,
      kind: MessageKind::Text,
    }
  }

  /// A system notification with a fresh id.
  pub fn system(content: impl Into<String>, timestamp: i64) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: Sender::System,
      user_name: SYSTEM_NAME.to_string(),
      avatar: None,
      content: content.into(),
      timestamp,
      kind: MessageKind::System,
    }
  }

  /// Notification for a missed target. The coins are not actually moved to
  /// anyone; the message is the whole effect on teammates.
  pub fn penalty_notice(name: &str, amount: u32, timestamp: i64) -> Self {
    Self::system(
      format!("{name} missed today's target and handed out a {amount}-coin red packet to the team!"),
      timestamp,
    )
  }

  /// Notification for a plan restart.
  pub fn reset_notice(name: &str, timestamp: i64) -> Self {
    Self::system(format!("Plan reset! {name} has started a new challenge."), timestamp)
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// Deduplicated chat history in receipt order.
///
/// The live history may grow past `window`; [`ChatLog::trim`] cuts it back to
/// the most recent `window` messages, which is what gets persisted.
#[derive(Debug, Clone)]
pub struct ChatLog {
  window:   usize,
  messages: VecDeque<ChatMessage>,
  seen:     HashSet<String>,
}

impl Default for ChatLog {
  fn default() -> Self { Self::new(DEFAULT_WINDOW) }
}

impl ChatLog {
  pub fn new(window: usize) -> Self {
    Self {
      window,
      messages: VecDeque::new(),
      seen: HashSet::new(),
    }
  }

  /// Rebuild from persisted messages, dropping duplicates.
  pub fn from_messages(window: usize, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
    let mut log = Self::new(window);
    for message in messages {
      log.merge(message);
    }
    log.trim();
    log
  }

  /// Append `message` unless its id is already present. Returns whether it
  /// was appended.
  pub fn merge(&mut self, message: ChatMessage) -> bool {
    if !self.seen.insert(message.id.clone()) {
      return false;
    }
    self.messages.push_back(message);
    true
  }

  /// Discard all but the most recent `window` messages.
  pub fn trim(&mut self) {
    while self.messages.len() > self.window {
      if let Some(old) = self.messages.pop_front() {
        self.seen.remove(&old.id);
      }
    }
  }

  /// The slice of history that is persisted: the last `window` messages.
  pub fn persisted(&self) -> Vec<ChatMessage> {
    let skip = self.messages.len().saturating_sub(self.window);
    self.messages.iter().skip(skip).cloned().collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> { self.messages.iter() }

  pub fn contains(&self, id: &str) -> bool { self.seen.contains(id) }

  pub fn len(&self) -> usize { self.messages.len() }

  pub fn is_empty(&self) -> bool { self.messages.is_empty() }

  pub fn window(&self) -> usize { self.window }
}
