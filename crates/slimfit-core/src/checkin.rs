//! The daily check-in state machine.
//!
//! ```text
//! AwaitingWeight ──(within tolerance)──────────────────────────▶ Submitted
//!       │                                                          ▲
//!       └──(over target or up on last weigh-in)──▶ AwaitingReflection
//! ```
//!
//! A submission yields the [`DailyLog`] to record and, when the weight is over
//! the allowed deviation, the penalty to charge. Applying either is the
//! caller's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, log::DailyLog};

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInPolicy {
  /// Kilograms above today's target, or above the previous weigh-in, that
  /// still pass without a reflection. The comparison is strict.
  pub reflection_tolerance: f64,
  /// Kilograms above today's target that still count as meeting it.
  pub allowed_deviation:    f64,
  /// Coins charged when the allowed deviation is exceeded.
  pub penalty_coins:        u32,
}

impl Default for CheckInPolicy {
  fn default() -> Self {
    Self {
      reflection_tolerance: 0.2,
      allowed_deviation:    0.5,
      penalty_coins:        50,
    }
  }
}

impl CheckInPolicy {
  pub fn needs_reflection(&self, weight: f64, today_target: f64, previous_weight: f64) -> bool {
    weight > today_target + self.reflection_tolerance
      || weight - previous_weight > self.reflection_tolerance
  }

  pub fn meets_target(&self, weight: f64, today_target: f64) -> bool {
    weight <= today_target + self.allowed_deviation
  }
}

// ─── Reflection reasons ──────────────────────────────────────────────────────

/// The canned reasons offered when a reflection is required. Free text is
/// accepted too; these only provide the stored labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionReason {
  Overate,
  NoExercise,
  Water,
  Period,
  Rest,
}

impl ReflectionReason {
  pub const ALL: [Self; 5] = [
    Self::Overate,
    Self::NoExercise,
    Self::Water,
    Self::Period,
    Self::Rest,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Overate => "Couldn't resist, ate too much",
      Self::NoExercise => "Too busy to exercise",
      Self::Water => "Water retention or constipation",
      Self::Period => "Menstrual cycle fluctuation",
      Self::Rest => "Planned rest day",
    }
  }
}

// ─── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInState {
  AwaitingWeight,
  AwaitingReflection,
  Submitted,
}

/// The outcome of a finished check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
  pub log:     DailyLog,
  /// Coins to charge, if the weight exceeded the allowed deviation.
  pub penalty: Option<u32>,
}

/// What the caller must do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
  NeedsReflection,
  Submitted(Submission),
}

/// A single day's check-in in progress.
#[derive(Debug, Clone)]
pub struct CheckIn {
  policy:          CheckInPolicy,
  date:            NaiveDate,
  today_target:    f64,
  previous_weight: f64,
  state:           CheckInState,
  weight:          Option<f64>,
  photo:           Option<String>,
}

impl CheckIn {
  /// Start a check-in for `date`. `previous_weight` is the last recorded
  /// weight, or the start weight if nothing has been recorded yet.
  pub fn new(
    policy: CheckInPolicy,
    date: NaiveDate,
    today_target: f64,
    previous_weight: f64,
  ) -> Self {
    Self {
      policy,
      date,
      today_target,
      previous_weight,
      state: CheckInState::AwaitingWeight,
      weight: None,
      photo: None,
    }
  }

  pub fn state(&self) -> CheckInState { self.state }

  pub fn date(&self) -> NaiveDate { self.date }

  pub fn today_target(&self) -> f64 { self.today_target }

  /// Change from the previous weigh-in; negative means a loss.
  pub fn delta(&self, weight: f64) -> f64 { weight - self.previous_weight }

  /// Submit the scale reading. Submits immediately unless a reflection is
  /// required.
  pub fn enter_weight(&mut self, weight: f64, photo: Option<String>) -> Result<Step> {
    if self.state != CheckInState::AwaitingWeight {
      return Err(Error::InvalidCheckInState);
    }
    if !weight.is_finite() || weight <= 0.0 {
      return Err(Error::InvalidWeight(weight));
    }

    if self
      .policy
      .needs_reflection(weight, self.today_target, self.previous_weight)
    {
      self.weight = Some(weight);
      self.photo  = photo;
      self.state  = CheckInState::AwaitingReflection;
      return Ok(Step::NeedsReflection);
    }

    Ok(Step::Submitted(self.finish(weight, photo, None)))
  }

  /// Supply the reflection and submit.
  pub fn reflect(&mut self, reason: impl Into<String>) -> Result<Submission> {
    if self.state != CheckInState::AwaitingReflection {
      return Err(Error::InvalidCheckInState);
    }
    let reason = reason.into();
    if reason.trim().is_empty() {
      return Err(Error::ReflectionRequired);
    }
    let weight = self.weight.ok_or(Error::InvalidCheckInState)?;
    let photo  = self.photo.take();
    Ok(self.finish(weight, photo, Some(reason.trim().to_string())))
  }

  /// Return from the reflection step to re-enter the weight.
  pub fn back(&mut self) {
    if self.state == CheckInState::AwaitingReflection {
      self.state  = CheckInState::AwaitingWeight;
      self.weight = None;
      self.photo  = None;
    }
  }

  fn finish(&mut self, weight: f64, photo: Option<String>, reflection: Option<String>) -> Submission {
    self.state = CheckInState::Submitted;
    let is_target_met = self.policy.meets_target(weight, self.today_target);
    Submission {
      log: DailyLog {
        date: self.date,
        weight,
        photo,
        reflection,
        is_target_met,
      },
      penalty: (!is_target_met).then_some(self.policy.penalty_coins),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 6, 1).unwrap() }

  fn check_in(previous: f64) -> CheckIn {
    CheckIn::new(CheckInPolicy::default(), today(), 65.0, previous)
  }

  #[test]
  fn over_target_by_more_than_tolerance_needs_reflection() {
    let mut c = check_in(65.2);
    assert_eq!(c.enter_weight(65.3, None).unwrap(), Step::NeedsReflection);
    assert_eq!(c.state(), CheckInState::AwaitingReflection);
  }

  #[test]
  fn within_tolerance_submits_immediately() {
    let mut c = check_in(65.2);
    let Step::Submitted(sub) = c.enter_weight(65.1, None).unwrap() else {
      panic!("expected immediate submission");
    };
    assert_eq!(c.state(), CheckInState::Submitted);
    assert_eq!(sub.log.date, today());
    assert_eq!(sub.log.weight, 65.1);
    assert!(sub.log.is_target_met);
    assert_eq!(sub.penalty, None);
  }

  #[test]
  fn gain_over_previous_weigh_in_needs_reflection() {
    // Under target, but 0.5 kg up on yesterday.
    let mut c = check_in(64.0);
    assert_eq!(c.enter_weight(64.5, None).unwrap(), Step::NeedsReflection);
  }

  #[test]
  fn penalty_only_past_allowed_deviation() {
    let mut c = check_in(65.6);
    assert_eq!(c.enter_weight(65.5, None).unwrap(), Step::NeedsReflection);
    let sub = c.reflect(ReflectionReason::Water.label()).unwrap();
    assert!(sub.log.is_target_met);
    assert_eq!(sub.penalty, None);

    let mut c = check_in(65.6);
    c.enter_weight(65.6, Some("photo-ref".into())).unwrap();
    let sub = c.reflect("ate too much").unwrap();
    assert!(!sub.log.is_target_met);
    assert_eq!(sub.penalty, Some(50));
    assert_eq!(sub.log.photo.as_deref(), Some("photo-ref"));
    assert_eq!(sub.log.reflection.as_deref(), Some("ate too much"));
  }

  #[test]
  fn blank_reflection_is_rejected() {
    let mut c = check_in(65.0);
    c.enter_weight(66.0, None).unwrap();
    assert!(matches!(c.reflect("  "), Err(Error::ReflectionRequired)));
    assert_eq!(c.state(), CheckInState::AwaitingReflection);
  }

  #[test]
  fn invalid_weights_are_rejected_without_state_change() {
    let mut c = check_in(65.0);
    assert!(matches!(c.enter_weight(f64::NAN, None), Err(Error::InvalidWeight(_))));
    assert!(matches!(c.enter_weight(0.0, None), Err(Error::InvalidWeight(_))));
    assert_eq!(c.state(), CheckInState::AwaitingWeight);
  }

  #[test]
  fn out_of_order_steps_are_rejected() {
    let mut c = check_in(65.0);
    assert!(matches!(c.reflect("x"), Err(Error::InvalidCheckInState)));
    c.enter_weight(64.9, None).unwrap();
    assert!(matches!(c.enter_weight(64.9, None), Err(Error::InvalidCheckInState)));
  }

  #[test]
  fn back_returns_to_weight_entry() {
    let mut c = check_in(65.0);
    c.enter_weight(66.0, None).unwrap();
    c.back();
    assert_eq!(c.state(), CheckInState::AwaitingWeight);
    assert!(matches!(c.enter_weight(64.8, None), Ok(Step::Submitted(_))));
  }

  #[test]
  fn custom_policy_is_honoured() {
    let policy = CheckInPolicy {
      reflection_tolerance: 1.0,
      allowed_deviation:    2.0,
      penalty_coins:        10,
    };
    let mut c = CheckIn::new(policy, today(), 65.0, 65.0);
    assert!(matches!(c.enter_weight(65.9, None), Ok(Step::Submitted(_))));

    let mut c = CheckIn::new(policy, today(), 65.0, 65.0);
    c.enter_weight(67.5, None).unwrap();
    assert_eq!(c.reflect("rest").unwrap().penalty, Some(10));
  }
}
