//! Engine tunables, deserialised from the `[engine]` config table.

use serde::Deserialize;
use slimfit_core::{chat::DEFAULT_WINDOW, checkin::CheckInPolicy};
use slimfit_sync::TransportSettings;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub check_in:           CheckInPolicy,
  /// Chat messages kept in storage.
  pub chat_window:        usize,
  /// Coin balance of a freshly onboarded profile.
  pub starting_coins:     u32,
  /// Plan length offered when none is given.
  pub default_plan_weeks: u32,
  pub transport:          TransportSettings,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      check_in:           CheckInPolicy::default(),
      chat_window:        DEFAULT_WINDOW,
      starting_coins:     1000,
      default_plan_weeks: 8,
      transport:          TransportSettings::default(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_table_keeps_defaults() {
    let cfg: EngineConfig = serde_json::from_value(serde_json::json!({
      "starting_coins": 200,
      "check_in": { "penalty_coins": 10 },
    }))
    .unwrap();

    assert_eq!(cfg.starting_coins, 200);
    assert_eq!(cfg.check_in.penalty_coins, 10);
    assert_eq!(cfg.check_in.allowed_deviation, 0.5);
    assert_eq!(cfg.chat_window, 50);
    assert_eq!(cfg.transport, TransportSettings::default());
  }
}
