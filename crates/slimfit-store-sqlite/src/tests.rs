//! Integration tests for `SqliteStore` against real SQLite databases.

use serde_json::json;
use slimfit_core::store::{CHAT_KEY, KeyValueStore, LOGS_KEY, USER_KEY};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

#[tokio::test]
async fn missing_key_returns_none() {
  let s = store().await;
  assert_eq!(s.get(USER_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get_returns_value() {
  let s = store().await;
  let profile = json!({"userId": "u1", "coins": 1000});
  s.set(USER_KEY, profile.clone()).await.unwrap();
  assert_eq!(s.get(USER_KEY).await.unwrap(), Some(profile));
}

#[tokio::test]
async fn set_overwrites_previous_value() {
  let s = store().await;
  s.set(LOGS_KEY, json!([{"weight": 70.0}])).await.unwrap();
  s.set(LOGS_KEY, json!([])).await.unwrap();
  assert_eq!(s.get(LOGS_KEY).await.unwrap(), Some(json!([])));
}

#[tokio::test]
async fn remove_deletes_and_is_idempotent() {
  let s = store().await;
  s.set(CHAT_KEY, json!(["m"])).await.unwrap();
  s.remove(CHAT_KEY).await.unwrap();
  s.remove(CHAT_KEY).await.unwrap();
  assert_eq!(s.get(CHAT_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn quota_refuses_writes_that_do_not_fit() {
  let s = store().await.with_quota(64);
  s.set(USER_KEY, json!({"name": "Ana"})).await.unwrap();

  let err = s
    .set(CHAT_KEY, json!(["x".repeat(100)]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::QuotaExceeded { limit: 64, .. }), "{err}");

  // The refused write leaves earlier data intact.
  assert_eq!(s.get(USER_KEY).await.unwrap(), Some(json!({"name": "Ana"})));
  assert_eq!(s.get(CHAT_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn quota_counts_replaced_key_once() {
  let s = store().await.with_quota(40);
  s.set("k", json!("a".repeat(30))).await.unwrap();
  s.set("k", json!("b".repeat(30))).await.unwrap();
  assert_eq!(s.get("k").await.unwrap(), Some(json!("b".repeat(30))));
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("slimfit.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set(USER_KEY, json!({"coins": 950})).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get(USER_KEY).await.unwrap(), Some(json!({"coins": 950})));
}
