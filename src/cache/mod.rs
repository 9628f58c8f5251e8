//! Generic caching layer for freshness decisions and offline fallback.
//!
//! This module provides:
//! - A `CacheStore` contract whose `is_stale` check is the sole freshness authority
//! - An in-process `MemoryCache` implementation
//! - Stable `CacheKey` strings per query
//! - `CacheLayer`, the cache → remote → local store chain every repository uses

mod key;
mod layer;
mod memory;
mod traits;

pub use key::CacheKey;
pub use layer::{CacheLayer, FreshnessPolicy, Lookup, Remote};
pub use memory::MemoryCache;
pub use traits::{CacheResult, CacheSource, CacheStore, Cacheable};
