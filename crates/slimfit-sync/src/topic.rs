//! Topic naming and pattern matching.
//!
//! Each team has two sub-channels: `team/{code}/presence`, published with
//! retain, and `team/{code}/chat`, plain fan-out with nothing retained. The
//! broker keeps one retained message per topic, so a late subscriber only
//! gets the most recent publisher's snapshot; other members show up as they
//! next publish.

use slimfit_core::team::TeamCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTopics {
  pub presence: String,
  pub chat:     String,
}

impl TeamTopics {
  pub fn new(team: &TeamCode) -> Self {
    Self {
      presence: format!("team/{team}/presence"),
      chat:     format!("team/{team}/chat"),
    }
  }
}

/// Match `topic` against an MQTT-style `pattern`: `+` matches exactly one
/// level, a trailing `#` matches the parent level and everything below it.
pub fn matches(pattern: &str, topic: &str) -> bool {
  let mut levels = topic.split('/');
  for filter in pattern.split('/') {
    match filter {
      "#" => return true,
      "+" => {
        if levels.next().is_none() {
          return false;
        }
      }
      literal => {
        if levels.next() != Some(literal) {
          return false;
        }
      }
    }
  }
  levels.next().is_none()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn team_topics() {
    let topics = TeamTopics::new(&TeamCode::parse("ab12cd").unwrap());
    assert_eq!(topics.presence, "team/AB12CD/presence");
    assert_eq!(topics.chat, "team/AB12CD/chat");
  }

  #[test]
  fn exact_and_wildcard_matching() {
    assert!(matches("team/X/chat", "team/X/chat"));
    assert!(!matches("team/X/chat", "team/X/presence"));
    assert!(!matches("team/X/chat", "team/X/chat/extra"));
    assert!(!matches("team/X/chat/extra", "team/X/chat"));

    assert!(matches("team/+/chat", "team/Y/chat"));
    assert!(!matches("team/+/chat", "team/chat"));

    assert!(matches("team/X/#", "team/X/presence"));
    assert!(matches("team/X/#", "team/X"));
    assert!(!matches("team/X/#", "team/Y/presence"));
    assert!(matches("#", "anything/at/all"));
  }
}
