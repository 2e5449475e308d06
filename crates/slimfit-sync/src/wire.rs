//! JSON payloads on the team topics and the typed union they decode into.

use slimfit_core::{chat::ChatMessage, presence::Teammate};

use crate::{Error, Result, topic::TeamTopics};

/// A decoded delivery from the team channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
  Presence(Teammate),
  Chat(ChatMessage),
}

pub fn encode_presence(snapshot: &Teammate) -> Result<Vec<u8>> {
  serde_json::to_vec(snapshot).map_err(Error::Encode)
}

pub fn encode_chat(message: &ChatMessage) -> Result<Vec<u8>> {
  serde_json::to_vec(message).map_err(Error::Encode)
}

/// Decode a delivery on `topic`.
///
/// Returns `Ok(None)` for topics outside this team and for an empty payload,
/// which is how a retained message gets cleared.
pub fn decode(topics: &TeamTopics, topic: &str, payload: &[u8]) -> Result<Option<Inbound>> {
  if payload.is_empty() {
    return Ok(None);
  }
  let decode_err = |source| Error::Decode {
    topic: topic.to_string(),
    source,
  };

  if topic == topics.presence {
    serde_json::from_slice(payload)
      .map(|p| Some(Inbound::Presence(p)))
      .map_err(decode_err)
  } else if topic == topics.chat {
    serde_json::from_slice(payload)
      .map(|m| Some(Inbound::Chat(m)))
      .map_err(decode_err)
  } else {
    Ok(None)
  }
}
