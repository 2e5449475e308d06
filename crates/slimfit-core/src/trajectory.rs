//! The expected-weight curve from start to target over the plan duration.
//!
//! Dates are compared at day granularity. Day 0 is a preparation day and
//! stays at the start weight; from the last day on the curve is pinned to the
//! target weight. Between those the curve is a straight line rounded to two
//! decimals.

use chrono::{DateTime, NaiveDate};

use crate::profile::{Route, UserProfile};

/// Number of days in a plan of `plan_weeks` weeks.
pub fn total_days(plan_weeks: u32) -> i64 { i64::from(plan_weeks) * 7 }

/// Whole calendar days from `start` to `current`; negative if `current`
/// precedes `start`.
pub fn days_between(start: NaiveDate, current: NaiveDate) -> i64 {
  current.signed_duration_since(start).num_days()
}

/// Parse a calendar day from either `YYYY-MM-DD` or an RFC 3339 timestamp.
/// The time-of-day part of a timestamp is discarded.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

/// Expected weight on `current_date`.
///
/// `route` does not change the numeric curve; it is accepted so callers keep
/// threading it through.
pub fn daily_target(
  start_weight:  f64,
  target_weight: f64,
  start_date:    NaiveDate,
  current_date:  NaiveDate,
  _route:        Route,
  total_days:    i64,
) -> f64 {
  let days_passed = days_between(start_date, current_date);

  if days_passed <= 0 {
    return start_weight;
  }
  if days_passed >= total_days {
    return target_weight;
  }

  let safe_total_days = if total_days > 0 { total_days } else { 1 };
  let loss_per_day = (start_weight - target_weight) / safe_total_days as f64;

  round_to(start_weight - loss_per_day * days_passed as f64, 2)
}

// ─── Trajectory ──────────────────────────────────────────────────────────────

/// A profile's plan parameters, captured once so the curve can be sampled for
/// many dates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
  pub start_weight:  f64,
  pub target_weight: f64,
  pub start_date:    NaiveDate,
  pub route:         Route,
  pub total_days:    i64,
}

impl Trajectory {
  pub fn for_profile(profile: &UserProfile) -> Self {
    Self {
      start_weight:  profile.start_weight,
      target_weight: profile.target_weight,
      start_date:    profile.start_date,
      route:         profile.route,
      total_days:    total_days(profile.plan_weeks),
    }
  }

  /// Expected weight on `date`.
  pub fn target_on(&self, date: NaiveDate) -> f64 {
    daily_target(
      self.start_weight,
      self.target_weight,
      self.start_date,
      date,
      self.route,
      self.total_days,
    )
  }

  /// Expected weight for a textual date. An unparseable date yields the start
  /// weight.
  pub fn target_on_str(&self, raw: &str) -> f64 {
    match parse_day(raw) {
      Some(date) => self.target_on(date),
      None => self.start_weight,
    }
  }

  /// The last day of the plan, on which the target weight is due.
  pub fn end_date(&self) -> NaiveDate {
    self.start_date + chrono::Duration::days(self.total_days.max(0))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

  fn curve(total: i64) -> Trajectory {
    Trajectory {
      start_weight:  70.0,
      target_weight: 60.0,
      start_date:    day("2026-01-01"),
      route:         Route::Gentle,
      total_days:    total,
    }
  }

  #[test]
  fn one_week_into_ten_week_plan() {
    let t = curve(70);
    assert_eq!(t.target_on(day("2026-01-08")), 69.0);
  }

  #[test]
  fn day_zero_and_before_return_start_weight() {
    let t = curve(70);
    assert_eq!(t.target_on(day("2026-01-01")), 70.0);
    assert_eq!(t.target_on(day("2025-12-01")), 70.0);
  }

  #[test]
  fn plan_end_and_after_return_target_weight() {
    let t = curve(70);
    assert_eq!(t.target_on(day("2026-03-12")), 60.0);
    assert_eq!(t.target_on(day("2027-01-01")), 60.0);
  }

  #[test]
  fn rounds_to_two_decimals() {
    // 10 kg over 21 days: 70 - 10/21 = 69.5238...
    let t = curve(21);
    assert_eq!(t.target_on(day("2026-01-02")), 69.52);
  }

  #[test]
  fn zero_length_plan_does_not_divide_by_zero() {
    let t = curve(0);
    assert_eq!(t.target_on(day("2026-01-02")), 60.0);
    assert_eq!(t.target_on(day("2026-01-01")), 70.0);
  }

  #[test]
  fn route_does_not_change_curve() {
    let gentle = daily_target(80.0, 70.0, day("2026-01-01"), day("2026-01-15"), Route::Gentle, 56);
    let aggressive =
      daily_target(80.0, 70.0, day("2026-01-01"), day("2026-01-15"), Route::Aggressive, 56);
    assert_eq!(gentle, aggressive);
  }

  #[test]
  fn unparseable_date_yields_start_weight() {
    let t = curve(70);
    assert_eq!(t.target_on_str("not a date"), 70.0);
    assert_eq!(t.target_on_str("2026-01-08"), 69.0);
    assert_eq!(t.target_on_str("2026-01-08T22:30:00+00:00"), 69.0);
  }

  #[test]
  fn end_date_is_start_plus_total_days() {
    assert_eq!(curve(70).end_date(), day("2026-03-12"));
  }

  proptest! {
    #[test]
    fn clamps_outside_plan(
      start in 50.0f64..150.0,
      loss in 1.0f64..40.0,
      weeks in 1u32..=24,
      offset in -400i64..400,
    ) {
      let total = total_days(weeks);
      let start_date = day("2026-01-01");
      let date = start_date + chrono::Duration::days(offset);
      let value = daily_target(start, start - loss, start_date, date, Route::Gentle, total);
      if offset <= 0 {
        prop_assert_eq!(value, start);
      }
      if offset >= total {
        prop_assert_eq!(value, start - loss);
      }
    }

    #[test]
    fn strictly_decreasing_within_plan(
      start in 60.0f64..150.0,
      per_day in 0.02f64..0.3,
      weeks in 1u32..=24,
    ) {
      let total = total_days(weeks);
      let target = start - per_day * total as f64;
      let start_date = day("2026-01-01");
      let mut previous = f64::INFINITY;
      for offset in 0..=total {
        let date = start_date + chrono::Duration::days(offset);
        let value = daily_target(start, target, start_date, date, Route::Aggressive, total);
        prop_assert!(value < previous, "day {offset}: {value} !< {previous}");
        previous = value;
      }
    }

    #[test]
    fn repeated_calls_agree(
      start in 50.0f64..150.0,
      loss in 0.0f64..40.0,
      weeks in 0u32..=24,
      offset in -30i64..200,
    ) {
      let start_date = day("2026-01-01");
      let date = start_date + chrono::Duration::days(offset);
      let total = total_days(weeks);
      let a = daily_target(start, start - loss, start_date, date, Route::Gentle, total);
      let b = daily_target(start, start - loss, start_date, date, Route::Gentle, total);
      prop_assert_eq!(a.to_bits(), b.to_bits());
    }
  }
}
