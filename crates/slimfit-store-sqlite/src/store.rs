//! [`SqliteStore`]: the SQLite implementation of [`KeyValueStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use serde_json::Value;
use slimfit_core::store::KeyValueStore;

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A key-value store backed by a single SQLite file.
///
/// Cloning is cheap; clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  quota: Option<usize>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, quota: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, quota: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Refuse writes that would make the stored keys and values exceed `bytes`.
  pub fn with_quota(mut self, bytes: usize) -> Self {
    self.quota = Some(bytes);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total bytes of keys and values, excluding `key` itself.
  async fn footprint_excluding(&self, key: String) -> Result<usize> {
    let used: i64 = self
      .conn
      .call(move |conn| {
        let used = conn.query_row(
          "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value_json AS BLOB))), 0)
             FROM kv WHERE key != ?1",
          rusqlite::params![key],
          |r| r.get(0),
        )?;
        Ok(used)
      })
      .await?;
    Ok(usize::try_from(used).unwrap_or(usize::MAX))
  }
}

// ─── KeyValueStore impl ──────────────────────────────────────────────────────

impl KeyValueStore for SqliteStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    let key = key.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT value_json FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get(0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|s| serde_json::from_str(&s))
      .transpose()
      .map_err(Error::Json)
  }

  async fn set(&self, key: &str, value: Value) -> Result<()> {
    let key_str   = key.to_owned();
    let value_str = serde_json::to_string(&value)?;

    if let Some(limit) = self.quota {
      let needed = self.footprint_excluding(key_str.clone()).await?
        + key_str.len()
        + value_str.len();
      if needed > limit {
        tracing::debug!(key, needed, limit, "write refused by quota");
        return Err(Error::QuotaExceeded { needed, limit });
      }
    }

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kv (key, value_json) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
          rusqlite::params![key_str, value_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
