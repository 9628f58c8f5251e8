//! In-memory `CacheStore` backed by a mutex-guarded map.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

use super::traits::CacheStore;

struct CacheEntry {
  value: serde_json::Value,
  stored_at: DateTime<Utc>,
  expiry: Duration,
}

impl CacheEntry {
  fn age(&self, now: DateTime<Utc>) -> Duration {
    now - self.stored_at
  }
}

#[derive(Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // Entries are replaced whole, so a panic mid-update cannot leave one half-written.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries().len()
  }

  /// Drop every entry that has outlived the expiry it was stored with.
  ///
  /// Returns the number of entries removed. Reads never do this implicitly.
  #[allow(dead_code)]
  pub fn purge_expired(&self) -> usize {
    let now = Utc::now();
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|_, entry| entry.age(now) <= entry.expiry);
    before - entries.len()
  }

  #[cfg(test)]
  pub fn backdate(&self, key: &str, by: Duration) {
    if let Some(entry) = self.entries().get_mut(key) {
      entry.stored_at = entry.stored_at - by;
    }
  }
}

impl CacheStore for MemoryCache {
  fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = self.entries().get(key)?.value.clone();
    match serde_json::from_value(value) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(key, error = %e, "Cached value has unexpected shape");
        None
      }
    }
  }

  fn set<T: Serialize>(&self, value: &T, key: &str, expiry: Duration) {
    let value = match serde_json::to_value(value) {
      Ok(v) => v,
      Err(e) => {
        warn!(key, error = %e, "Failed to serialize value for cache");
        return;
      }
    };

    self.entries().insert(
      key.to_string(),
      CacheEntry {
        value,
        stored_at: Utc::now(),
        expiry,
      },
    );
  }

  fn is_stale(&self, key: &str, max_age: Duration) -> bool {
    match self.entries().get(key) {
      Some(entry) => entry.age(Utc::now()) > max_age,
      None => true,
    }
  }

  fn remove(&self, key: &str) {
    self.entries().remove(key);
  }

  fn clear(&self) {
    self.entries().clear();
  }
}
