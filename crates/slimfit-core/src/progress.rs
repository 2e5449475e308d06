//! Progress figures and the chart series for the trajectory view.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  log::LogStore,
  profile::UserProfile,
  trajectory::{Trajectory, days_between, total_days},
};

/// Whole days since the plan started, never negative.
pub fn days_passed(start: NaiveDate, today: NaiveDate) -> i64 { days_between(start, today).max(0) }

/// Share of the planned loss already achieved, as a percentage in `[0, 100]`.
pub fn weight_progress(profile: &UserProfile) -> f64 {
  let planned = profile.start_weight - profile.target_weight;
  if planned <= 0.0 {
    return 0.0;
  }
  ((profile.start_weight - profile.current_weight) * 100.0 / planned).clamp(0.0, 100.0)
}

/// Share of the plan duration elapsed, as a percentage in `[0, 100]`.
pub fn time_progress(profile: &UserProfile, today: NaiveDate) -> f64 {
  let total = total_days(profile.plan_weeks);
  if total <= 0 {
    return 100.0;
  }
  (days_passed(profile.start_date, today) as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
  Start,
  Log,
  Today,
  End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
  pub date:   NaiveDate,
  /// Recorded weight; absent for projected points.
  pub weight: Option<f64>,
  pub target: f64,
  pub kind:   PointKind,
}

/// Points for the weight-versus-target chart, in date order.
///
/// Logs dated before the plan start are skipped.
pub fn chart_series(profile: &UserProfile, logs: &LogStore, today: NaiveDate) -> Vec<ChartPoint> {
  let curve = Trajectory::for_profile(profile);
  let mut points = vec![ChartPoint {
    date:   profile.start_date,
    weight: Some(profile.start_weight),
    target: profile.start_weight,
    kind:   PointKind::Start,
  }];

  points.extend(
    logs
      .by_date()
      .into_iter()
      .filter(|log| log.date >= profile.start_date)
      .map(|log| ChartPoint {
        date:   log.date,
        weight: Some(log.weight),
        target: curve.target_on(log.date),
        kind:   PointKind::Log,
      }),
  );

  if logs.get(today).is_none() && today >= profile.start_date {
    points.push(ChartPoint {
      date:   today,
      weight: None,
      target: curve.target_on(today),
      kind:   PointKind::Today,
    });
  }

  points.push(ChartPoint {
    date:   curve.end_date(),
    weight: None,
    target: profile.target_weight,
    kind:   PointKind::End,
  });

  points
}
