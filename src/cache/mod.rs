//! Bounded in-memory cache for weather snapshots
//!
//! The cache is the single source of truth for "is this city's data fresh".
//! Capacity is bounded with LRU eviction; TTL validity is an independent
//! overlay, so an entry can be expired yet still occupy a slot until it is
//! naturally evicted or refreshed in place.

mod store;

pub use store::{normalize_key, CacheEntry, WeatherStore};
