//! Wall-clock access, injected so tests can pin "today".

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};

pub trait Clock: Send + Sync {
  /// The local calendar day.
  fn today(&self) -> NaiveDate;

  /// Epoch milliseconds.
  fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate { Local::now().date_naive() }

  fn now_millis(&self) -> i64 { Utc::now().timestamp_millis() }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
  now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
  /// Noon UTC on `day`.
  pub fn on(day: NaiveDate) -> Self {
    let now = day.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc();
    Self { now: Arc::new(Mutex::new(now)) }
  }

  pub fn advance_days(&self, days: i64) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now += TimeDelta::days(days);
  }

  fn now(&self) -> DateTime<Utc> { *self.now.lock().unwrap_or_else(PoisonError::into_inner) }
}

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate { self.now().date_naive() }

  fn now_millis(&self) -> i64 { self.now().timestamp_millis() }
}
