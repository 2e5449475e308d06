//! Team presence snapshots and the roster they are merged into.
//!
//! Each member owns and re-publishes only its own snapshot. Receivers merge
//! by member identity with last-write-wins: a newer delivery replaces the old
//! record in place. Records never expire; a member that goes quiet stays on
//! the roster with its last known state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
  #[default]
  Pending,
  Success,
  Fail,
}

/// A member's latest known state, as carried on the presence channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teammate {
  pub user_id:     Uuid,
  pub name:        String,
  pub avatar:      String,
  pub status:      PresenceStatus,
  pub weight_lost: f64,
  /// Epoch milliseconds on the publisher's clock.
  pub last_seen:   i64,
}

/// What a merge did to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
  Ignored,
  Inserted,
  Replaced,
}

/// The local view of the other members of a team.
#[derive(Debug, Clone)]
pub struct Roster {
  self_id: Uuid,
  members: Vec<Teammate>,
}

impl Roster {
  /// An empty roster for the member identified by `self_id`, whose own
  /// snapshots are never merged.
  pub fn new(self_id: Uuid) -> Self {
    Self {
      self_id,
      members: Vec::new(),
    }
  }

  pub fn merge(&mut self, snapshot: Teammate) -> Merge {
    if snapshot.user_id == self.self_id {
      return Merge::Ignored;
    }
    match self
      .members
      .iter_mut()
      .find(|m| m.user_id == snapshot.user_id)
    {
      Some(existing) => {
        *existing = snapshot;
        Merge::Replaced
      }
      None => {
        self.members.push(snapshot);
        Merge::Inserted
      }
    }
  }

  /// Members in first-seen order.
  pub fn members(&self) -> &[Teammate] { &self.members }

  pub fn get(&self, user_id: Uuid) -> Option<&Teammate> {
    self.members.iter().find(|m| m.user_id == user_id)
  }

  pub fn len(&self) -> usize { self.members.len() }

  pub fn is_empty(&self) -> bool { self.members.is_empty() }

  /// Drop every record, e.g. when switching teams.
  pub fn clear(&mut self) { self.members.clear(); }
}
