//! Cache layer that orchestrates cache, remote, and local-store fallbacks.

use chrono::Duration;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::traits::{CacheResult, CacheStore, Cacheable};
use crate::error::FetchResult;

/// Freshness settings for one entity family.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
  /// Maximum age at which a cached value is served without re-fetching
  pub stale_after: Duration,
  /// Expiry recorded with each cache entry (eviction hint only)
  pub ttl: Duration,
}

impl FreshnessPolicy {
  pub fn new(stale_after: Duration, ttl: Duration) -> Self {
    Self { stale_after, ttl }
  }
}

/// A decoded remote value together with the raw payload it came from.
pub struct Remote<T> {
  pub value: T,
  pub raw: Vec<u8>,
}

/// Outcome of looking up a key in the cache.
#[derive(Debug)]
pub enum Lookup<T> {
  /// Within the staleness window and complete
  Fresh(T),
  /// Within the staleness window but flagged by `Cacheable::requires_refresh`
  Incomplete(T),
  /// Missing, too old, or undecodable
  Miss,
}

/// Cache layer shared by every repository.
///
/// Sits between the repositories and their data sources and implements the
/// cache → remote → local store fallback chain once for every entity family.
pub struct CacheLayer<S: CacheStore> {
  store: Arc<S>,
}

impl<S: CacheStore> CacheLayer<S> {
  pub fn new(store: S) -> Self {
    Self {
      store: Arc::new(store),
    }
  }

  #[cfg(test)]
  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn lookup<T: Cacheable>(&self, key: &CacheKey, policy: &FreshnessPolicy) -> Lookup<T> {
    let key = key.to_string();
    let Some(cached) = self.store.get::<T>(&key) else {
      debug!(%key, "Cache miss");
      return Lookup::Miss;
    };

    if self.store.is_stale(&key, policy.stale_after) {
      debug!(%key, "Cache entry is stale");
      return Lookup::Miss;
    }

    if cached.requires_refresh() {
      debug!(%key, "Cache entry is fresh but incomplete");
      return Lookup::Incomplete(cached);
    }

    debug!(%key, "Cache hit");
    Lookup::Fresh(cached)
  }

  /// Write `value` under `key`, skipping values not worth caching.
  pub fn put<T: Cacheable>(&self, key: &CacheKey, value: &T, policy: &FreshnessPolicy) {
    if value.worth_caching() {
      self.store.set(value, &key.to_string(), policy.ttl);
    }
  }

  pub fn invalidate(&self, key: &CacheKey) {
    self.store.remove(&key.to_string());
  }

  /// Fetch with the cache-first fallback strategy.
  ///
  /// 1. Fresh, complete cache entry - return immediately
  /// 2. Otherwise fetch remote; on success cache it and persist the raw payload
  ///    (persistence failures are logged, never returned). Values not worth
  ///    caching are returned but neither cached nor persisted.
  /// 3. On remote failure, load from the local store and cache that
  /// 4. If the local store has nothing usable, return the remote error
  pub async fn fetch<T, R, Fut, P, L>(
    &self,
    key: &CacheKey,
    policy: &FreshnessPolicy,
    remote: R,
    persist: P,
    local: L,
  ) -> FetchResult<CacheResult<T>>
  where
    T: Cacheable,
    R: FnOnce() -> Fut,
    Fut: Future<Output = FetchResult<Remote<T>>>,
    P: FnOnce(&[u8]) -> FetchResult<()>,
    L: FnOnce() -> FetchResult<Option<T>>,
  {
    if let Lookup::Fresh(cached) = self.lookup::<T>(key, policy) {
      return Ok(CacheResult::from_cache(cached));
    }

    let remote_err = match remote().await {
      Ok(Remote { value, raw }) => {
        // An empty payload must not replace what the local store already holds
        if value.worth_caching() {
          self.put(key, &value, policy);
          if let Err(e) = persist(&raw) {
            warn!(%key, error = %e, "Failed to persist payload to local store");
          }
        }
        return Ok(CacheResult::from_network(value));
      }
      Err(e) => e,
    };

    warn!(%key, error = %remote_err, "Remote fetch failed, falling back to local store");

    match local() {
      Ok(Some(value)) if value.worth_caching() => {
        self.put(key, &value, policy);
        Ok(CacheResult::offline(value))
      }
      Ok(_) => {
        debug!(%key, "Local store has nothing for this query");
        Err(remote_err)
      }
      Err(local_err) => {
        warn!(%key, error = %local_err, "Local store fallback failed");
        Err(remote_err)
      }
    }
  }
}

impl<S: CacheStore> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryCache};
  use crate::error::FetchError;
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicU32, Ordering};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: u32,
    complete: bool,
  }

  impl Cacheable for Item {
    fn requires_refresh(&self) -> bool {
      !self.complete
    }
  }

  fn policy() -> FreshnessPolicy {
    FreshnessPolicy::new(Duration::minutes(15), Duration::minutes(5))
  }

  fn remote_ok(items: Vec<Item>) -> FetchResult<Remote<Vec<Item>>> {
    let raw = serde_json::to_vec(&items).unwrap();
    Ok(Remote { value: items, raw })
  }

  fn item(id: u32) -> Item {
    Item { id, complete: true }
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_remote() {
    let layer = CacheLayer::new(MemoryCache::new());
    layer.put(&CacheKey::Players, &vec![item(1)], &policy());

    let calls = AtomicU32::new(0);
    let result = layer
      .fetch(
        &CacheKey::Players,
        &policy(),
        || async {
          calls.fetch_add(1, Ordering::SeqCst);
          remote_ok(vec![item(2)])
        },
        |_| Ok(()),
        || Ok(None),
      )
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.source, CacheSource::Cache);
    assert_eq!(result.data, vec![item(1)]);
  }

  #[tokio::test]
  async fn test_stale_cache_refetches_once() {
    let layer = CacheLayer::new(MemoryCache::new());
    layer.put(&CacheKey::Players, &vec![item(1)], &policy());
    layer
      .store()
      .backdate("players_all", Duration::minutes(16));

    let calls = AtomicU32::new(0);
    let result = layer
      .fetch(
        &CacheKey::Players,
        &policy(),
        || async {
          calls.fetch_add(1, Ordering::SeqCst);
          remote_ok(vec![item(2)])
        },
        |_| Ok(()),
        || Ok(None),
      )
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(
      layer.store().get::<Vec<Item>>("players_all"),
      Some(vec![item(2)])
    );
    assert!(!layer.store().is_stale("players_all", Duration::minutes(15)));
  }

  #[tokio::test]
  async fn test_persist_failure_is_swallowed() {
    let layer = CacheLayer::new(MemoryCache::new());
    let result = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { remote_ok(vec![item(1)]) },
        |_| Err(FetchError::LocalStore("disk full".into())),
        || Ok(None),
      )
      .await
      .unwrap();

    assert_eq!(result.data, vec![item(1)]);
  }

  #[tokio::test]
  async fn test_remote_failure_uses_local_store() {
    let layer = CacheLayer::new(MemoryCache::new());
    let result = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { Err::<Remote<Vec<Item>>, _>(FetchError::Transport("offline".into())) },
        |_| Ok(()),
        || Ok(Some(vec![item(7)])),
      )
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::LocalStore);
    assert_eq!(result.data, vec![item(7)]);
    assert_eq!(
      layer.store().get::<Vec<Item>>("teams_all"),
      Some(vec![item(7)])
    );
  }

  #[tokio::test]
  async fn test_remote_and_local_failure_returns_remote_error() {
    let layer = CacheLayer::new(MemoryCache::new());
    let err = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { Err::<Remote<Vec<Item>>, _>(FetchError::Transport("offline".into())) },
        |_| Ok(()),
        || Err(FetchError::LocalStore("corrupt".into())),
      )
      .await
      .unwrap_err();

    assert_eq!(err, FetchError::Transport("offline".into()));
  }

  #[tokio::test]
  async fn test_empty_local_store_returns_remote_error() {
    let layer = CacheLayer::new(MemoryCache::new());
    let err = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { Err::<Remote<Vec<Item>>, _>(FetchError::Transport("offline".into())) },
        |_| Ok(()),
        || Ok(Some(Vec::new())),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)));
  }

  #[tokio::test]
  async fn test_empty_remote_result_not_cached() {
    let layer = CacheLayer::new(MemoryCache::new());
    let result = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { remote_ok(Vec::new()) },
        |_| Ok(()),
        || Ok(None),
      )
      .await
      .unwrap();

    assert!(result.data.is_empty());
    assert_eq!(layer.store().get::<Vec<Item>>("teams_all"), None);
  }

  #[tokio::test]
  async fn test_empty_remote_result_keeps_local_store() {
    let layer = CacheLayer::new(MemoryCache::new());
    let stored = serde_json::to_vec(&vec![item(3)]).unwrap();
    let local = std::sync::Mutex::new(stored.clone());

    let result = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { remote_ok(Vec::new()) },
        |raw| {
          *local.lock().unwrap() = raw.to_vec();
          Ok(())
        },
        || Ok(None),
      )
      .await
      .unwrap();
    assert!(result.data.is_empty());
    assert_eq!(*local.lock().unwrap(), stored);

    let offline = layer
      .fetch(
        &CacheKey::Teams,
        &policy(),
        || async { Err::<Remote<Vec<Item>>, _>(FetchError::Transport("offline".into())) },
        |_| Ok(()),
        || Ok(Some(serde_json::from_slice::<Vec<Item>>(&local.lock().unwrap()).unwrap())),
      )
      .await
      .unwrap();
    assert_eq!(offline.source, CacheSource::LocalStore);
    assert_eq!(offline.data, vec![item(3)]);
  }

  #[test]
  fn test_lookup_flags_incomplete_values() {
    let layer = CacheLayer::new(MemoryCache::new());
    let key = CacheKey::game("1");
    layer.put(
      &key,
      &Item {
        id: 1,
        complete: false,
      },
      &policy(),
    );

    assert!(matches!(
      layer.lookup::<Item>(&key, &policy()),
      Lookup::Incomplete(_)
    ));
  }
}
