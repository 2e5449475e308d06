//! The `KeyValueStore` persistence trait and an in-memory implementation.
//!
//! The trait is implemented by storage backends (e.g. `slimfit-store-sqlite`).
//! The engine depends on this abstraction only. Writes are best-effort: a
//! backend may refuse a write with a quota error, and callers are expected to
//! carry on with their in-memory state.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Mutex, PoisonError},
};

use serde_json::Value;

use crate::Error;

// ─── Keys ────────────────────────────────────────────────────────────────────

pub const USER_KEY: &str = "slimfit_user";
pub const LOGS_KEY: &str = "slimfit_logs";
pub const CHAT_KEY: &str = "slimfit_chat";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// String-keyed storage of JSON values.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the value stored under `key`, or `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key`. Removing an absent key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A process-local store, optionally limited to a byte quota measured over
/// keys plus serialised values.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, Value>>,
  quota:   Option<usize>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_quota(bytes: usize) -> Self {
    Self {
      entries: Mutex::default(),
      quota:   Some(bytes),
    }
  }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn footprint(key: &str, value: &Value) -> usize { key.len() + value.to_string().len() }

impl KeyValueStore for MemoryStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
    Ok(self.entries().get(key).cloned())
  }

  async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
    let mut entries = self.entries();
    if let Some(limit) = self.quota {
      let others: usize = entries
        .iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| footprint(k, v))
        .sum();
      let needed = others + footprint(key, &value);
      if needed > limit {
        return Err(Error::QuotaExceeded { needed, limit });
      }
    }
    entries.insert(key.to_string(), value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Error> {
    self.entries().remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get(USER_KEY).await.unwrap(), None);

    store.set(USER_KEY, json!({"name": "Ana"})).await.unwrap();
    assert_eq!(store.get(USER_KEY).await.unwrap(), Some(json!({"name": "Ana"})));

    store.remove(USER_KEY).await.unwrap();
    store.remove(USER_KEY).await.unwrap();
    assert_eq!(store.get(USER_KEY).await.unwrap(), None);
  }

  #[tokio::test]
  async fn quota_rejects_oversized_write_and_keeps_old_value() {
    let store = MemoryStore::with_quota(40);
    store.set(CHAT_KEY, json!(["short"])).await.unwrap();

    let big = json!(["x".repeat(64)]);
    let err = store.set(CHAT_KEY, big).await.unwrap_err();
    assert!(matches!(err, Error::QuotaExceeded { limit: 40, .. }));
    assert_eq!(store.get(CHAT_KEY).await.unwrap(), Some(json!(["short"])));
  }

  #[tokio::test]
  async fn overwriting_a_key_does_not_count_it_twice() {
    let store = MemoryStore::with_quota(30);
    store.set("k", json!("aaaaaaaaaaaaaaaaaaaa")).await.unwrap();
    store.set("k", json!("bbbbbbbbbbbbbbbbbbbb")).await.unwrap();
  }
}
