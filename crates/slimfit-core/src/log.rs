//! Per-day check-in entries and the collection that holds them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry per calendar day. Never edited in place; a later submission for
/// the same date replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
  pub date:          NaiveDate,
  pub weight:        f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photo:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reflection:    Option<String>,
  /// Whether the day's target was met, decided at submission time.
  pub is_target_met: bool,
}

/// Ordered collection of [`DailyLog`]s with at most one entry per date.
///
/// Iteration order is insertion order; replacing an entry moves it to the
/// end, as if it had just been submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogStore {
  entries: Vec<DailyLog>,
}

impl LogStore {
  pub fn new() -> Self { Self::default() }

  /// Build a store from persisted entries, keeping the last entry for any
  /// duplicated date.
  pub fn from_entries(entries: impl IntoIterator<Item = DailyLog>) -> Self {
    let mut store = Self::new();
    for entry in entries {
      store.upsert(entry);
    }
    store
  }

  /// Insert `log`, replacing any existing entry for the same date. Returns
  /// the replaced entry.
  pub fn upsert(&mut self, log: DailyLog) -> Option<DailyLog> {
    let previous = self
      .entries
      .iter()
      .position(|e| e.date == log.date)
      .map(|i| self.entries.remove(i));
    self.entries.push(log);
    previous
  }

  /// All entries in submission order.
  pub fn all(&self) -> &[DailyLog] { &self.entries }

  /// All entries sorted by date, for charting.
  pub fn by_date(&self) -> Vec<&DailyLog> {
    let mut sorted: Vec<_> = self.entries.iter().collect();
    sorted.sort_by_key(|e| e.date);
    sorted
  }

  pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
    self.entries.iter().find(|e| e.date == date)
  }

  /// The most recently submitted entry.
  pub fn last(&self) -> Option<&DailyLog> { self.entries.last() }

  /// Remove every entry. Only a plan reset does this.
  pub fn clear(&mut self) { self.entries.clear(); }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn log(date: &str, weight: f64) -> DailyLog {
    DailyLog {
      date: date.parse().unwrap(),
      weight,
      photo: None,
      reflection: None,
      is_target_met: true,
    }
  }

  #[test]
  fn same_date_is_replaced() {
    let mut store = LogStore::new();
    store.upsert(log("2026-05-01", 70.0));
    let replaced = store.upsert(log("2026-05-01", 69.4));

    assert_eq!(replaced.map(|l| l.weight), Some(70.0));
    assert_eq!(store.len(), 1);
    assert_eq!(store.all()[0].weight, 69.4);
  }

  #[test]
  fn replacement_moves_to_end_of_submission_order() {
    let mut store = LogStore::new();
    store.upsert(log("2026-05-01", 70.0));
    store.upsert(log("2026-05-02", 69.8));
    store.upsert(log("2026-05-01", 69.9));

    let dates: Vec<_> = store.all().iter().map(|l| l.date.to_string()).collect();
    assert_eq!(dates, ["2026-05-02", "2026-05-01"]);
    assert_eq!(store.last().map(|l| l.weight), Some(69.9));
  }

  #[test]
  fn by_date_sorts_for_charting() {
    let store = LogStore::from_entries([
      log("2026-05-03", 69.5),
      log("2026-05-01", 70.0),
      log("2026-05-02", 69.8),
    ]);
    let weights: Vec<_> = store.by_date().iter().map(|l| l.weight).collect();
    assert_eq!(weights, [70.0, 69.8, 69.5]);
  }

  #[test]
  fn from_entries_collapses_duplicate_dates() {
    let store = LogStore::from_entries([log("2026-05-01", 70.0), log("2026-05-01", 68.0)]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("2026-05-01".parse().unwrap()).map(|l| l.weight), Some(68.0));
  }

  #[test]
  fn clear_empties_the_store() {
    let mut store = LogStore::from_entries([log("2026-05-01", 70.0)]);
    store.clear();
    assert!(store.is_empty());
  }

  #[test]
  fn serialises_as_plain_array() {
    let store = LogStore::from_entries([log("2026-05-01", 70.0)]);
    let json = serde_json::to_value(&store).unwrap();
    assert!(json.is_array());
    assert_eq!(json[0]["isTargetMet"], true);
    assert!(json[0].get("photo").is_none());
  }
}
