//! Core traits and types for the caching system.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};

/// Process-local key/value store with per-entry age bookkeeping.
///
/// `is_stale` is the only freshness authority. The `expiry` recorded by `set`
/// is an eviction hint and never hides an entry from `get`.
pub trait CacheStore: Send + Sync {
  /// Read the value stored under `key`, if any and if it decodes as `T`.
  fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

  /// Store `value` under `key`, replacing any previous entry.
  fn set<T: Serialize>(&self, value: &T, key: &str, expiry: Duration);

  /// True when the entry is missing or older than `max_age`.
  fn is_stale(&self, key: &str, max_age: Duration) -> bool;

  fn remove(&self, key: &str);

  #[allow(dead_code)]
  fn clear(&self);
}

/// Values the fallback layer knows how to cache.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Empty results are served but never written to the cache.
  fn worth_caching(&self) -> bool {
    true
  }

  /// Overrides time-based freshness: a cached value that returns true here
  /// is treated as stale regardless of its age.
  fn requires_refresh(&self) -> bool {
    false
  }
}

impl<T: Cacheable> Cacheable for Vec<T> {
  fn worth_caching(&self) -> bool {
    !self.is_empty()
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  /// Network unavailable, serving previously persisted data.
  pub fn offline(data: T) -> Self {
    Self {
      data,
      source: CacheSource::LocalStore,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the remote source
  Network,
  /// Cached data still inside its staleness window
  Cache,
  /// Offline mode - remote unavailable, serving the local store
  LocalStore,
}
