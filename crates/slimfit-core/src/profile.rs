//! The user's identity and plan parameters.
//!
//! A profile is owned exclusively by the local instance. `start_date` and
//! `start_weight` only change through [`UserProfile::reset_plan`], which the
//! engine pairs with clearing the log history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  plan::recommend_route,
  team::TeamCode,
};

/// Plans are between one week and half a year long.
pub const PLAN_WEEKS_RANGE: std::ops::RangeInclusive<u32> = 1..=24;

/// Display name used when onboarding leaves the name blank.
pub const DEFAULT_NAME: &str = "Me";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  #[default]
  Female,
}

/// The pacing variant of a plan. Affects the suggested diet and workout, not
/// the numeric trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
  #[default]
  Gentle,
  Aggressive,
}

impl std::fmt::Display for Route {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Route::Gentle => "gentle",
      Route::Aggressive => "aggressive",
    })
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub user_id:        Uuid,
  pub name:           String,
  /// Image reference or an emoji.
  pub avatar:         String,
  pub gender:         Gender,
  pub age:            u32,
  pub height:         f64,
  pub start_weight:   f64,
  pub current_weight: f64,
  pub target_weight:  f64,
  pub start_date:     NaiveDate,
  pub plan_weeks:     u32,
  pub route:          Route,
  pub coins:          u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub team_id:        Option<TeamCode>,
}

impl UserProfile {
  /// Deduct `amount` coins, flooring the balance at zero. Returns the new
  /// balance.
  pub fn charge(&mut self, amount: u32) -> u32 {
    self.coins = self.coins.saturating_sub(amount);
    self.coins
  }

  /// Kilograms lost since the plan started, rounded to one decimal.
  pub fn weight_lost(&self) -> f64 {
    crate::trajectory::round_to(self.start_weight - self.current_weight, 1)
  }

  /// Restart the plan from `today` at the current weight with new goals.
  pub fn reset_plan(&mut self, edit: &PlanEdit, today: NaiveDate) -> Result<()> {
    edit.validate(self.current_weight)?;
    self.target_weight = edit.target_weight;
    self.plan_weeks    = edit.plan_weeks;
    self.route         = recommend_route(self.current_weight, edit.target_weight, edit.plan_weeks);
    self.start_date    = today;
    self.start_weight  = self.current_weight;
    Ok(())
  }
}

// ─── Onboarding input ────────────────────────────────────────────────────────

/// Raw onboarding answers, validated into a [`UserProfile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
  pub name:           String,
  pub avatar:         String,
  pub gender:         Gender,
  pub age:            u32,
  pub height_cm:      f64,
  pub current_weight: f64,
  pub target_weight:  f64,
  pub plan_weeks:     u32,
}

impl ProfileDraft {
  /// Validate the draft and build a fresh profile starting on `today`.
  pub fn into_profile(self, today: NaiveDate, starting_coins: u32) -> Result<UserProfile> {
    if self.age == 0 {
      return Err(Error::IncompleteProfile("age"));
    }
    if !is_positive(self.height_cm) {
      return Err(Error::IncompleteProfile("height"));
    }
    if !is_positive(self.current_weight) {
      return Err(Error::IncompleteProfile("current_weight"));
    }
    let edit = PlanEdit {
      target_weight: self.target_weight,
      plan_weeks:    self.plan_weeks,
    };
    edit.validate(self.current_weight)?;

    let name = match self.name.trim() {
      "" => DEFAULT_NAME.to_string(),
      trimmed => trimmed.to_string(),
    };

    Ok(UserProfile {
      user_id: Uuid::new_v4(),
      name,
      avatar: self.avatar,
      gender: self.gender,
      age: self.age,
      height: self.height_cm,
      start_weight: self.current_weight,
      current_weight: self.current_weight,
      target_weight: self.target_weight,
      start_date: today,
      plan_weeks: self.plan_weeks,
      route: recommend_route(self.current_weight, self.target_weight, self.plan_weeks),
      coins: starting_coins,
      team_id: None,
    })
  }
}

/// New goals for a plan reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanEdit {
  pub target_weight: f64,
  pub plan_weeks:    u32,
}

impl PlanEdit {
  fn validate(&self, current_weight: f64) -> Result<()> {
    if !is_positive(self.target_weight) || self.target_weight >= current_weight {
      return Err(Error::IncompleteProfile("target_weight"));
    }
    if !PLAN_WEEKS_RANGE.contains(&self.plan_weeks) {
      return Err(Error::IncompleteProfile("plan_weeks"));
    }
    Ok(())
  }
}

fn is_positive(value: f64) -> bool { value.is_finite() && value > 0.0 }

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() }

  fn draft() -> ProfileDraft {
    ProfileDraft {
      name:           "  Ana ".into(),
      avatar:         "🐱".into(),
      gender:         Gender::Female,
      age:            31,
      height_cm:      165.0,
      current_weight: 70.0,
      target_weight:  62.0,
      plan_weeks:     8,
    }
  }

  #[test]
  fn draft_becomes_profile_starting_today() {
    let p = draft().into_profile(today(), 1000).unwrap();
    assert_eq!(p.name, "Ana");
    assert_eq!(p.start_date, today());
    assert_eq!(p.start_weight, 70.0);
    assert_eq!(p.current_weight, 70.0);
    assert_eq!(p.coins, 1000);
    assert_eq!(p.route, Route::Aggressive);
    assert!(p.team_id.is_none());
  }

  #[test]
  fn blank_name_gets_default() {
    let p = ProfileDraft { name: "   ".into(), ..draft() }
      .into_profile(today(), 1000)
      .unwrap();
    assert_eq!(p.name, DEFAULT_NAME);
  }

  #[test]
  fn rejects_incomplete_drafts() {
    let cases = [
      (ProfileDraft { age: 0, ..draft() }, "age"),
      (ProfileDraft { height_cm: f64::NAN, ..draft() }, "height"),
      (ProfileDraft { current_weight: -1.0, ..draft() }, "current_weight"),
      (ProfileDraft { target_weight: 75.0, ..draft() }, "target_weight"),
      (ProfileDraft { plan_weeks: 0, ..draft() }, "plan_weeks"),
      (ProfileDraft { plan_weeks: 25, ..draft() }, "plan_weeks"),
    ];
    for (input, field) in cases {
      match input.into_profile(today(), 1000) {
        Err(Error::IncompleteProfile(f)) => assert_eq!(f, field),
        other => panic!("expected IncompleteProfile({field}), got {other:?}"),
      }
    }
  }

  #[test]
  fn charge_floors_at_zero() {
    let mut p = draft().into_profile(today(), 30).unwrap();
    assert_eq!(p.charge(50), 0);
    assert_eq!(p.coins, 0);
  }

  #[test]
  fn reset_moves_start_to_current_weight() {
    let mut p = draft().into_profile(today(), 1000).unwrap();
    p.current_weight = 67.5;
    let later = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
    p.reset_plan(&PlanEdit { target_weight: 64.0, plan_weeks: 12 }, later).unwrap();
    assert_eq!(p.start_date, later);
    assert_eq!(p.start_weight, 67.5);
    assert_eq!(p.target_weight, 64.0);
    assert_eq!(p.plan_weeks, 12);
    assert_eq!(p.route, Route::Gentle);
    assert_eq!(p.coins, 1000);
  }

  #[test]
  fn profile_json_uses_camel_case_keys() {
    let p = draft().into_profile(today(), 1000).unwrap();
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["startDate"], "2026-03-01");
    assert_eq!(json["planWeeks"], 8);
    assert_eq!(json["route"], "aggressive");
    assert!(json.get("teamId").is_none());
  }
}
