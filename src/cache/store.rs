//! LRU weather store with TTL validity overlay
//!
//! Recency governs eviction order; TTL governs validity, independently.
//! An entry can be LRU-fresh but TTL-expired: reads report it absent, yet it
//! stays in the store occupying capacity so the polling scheduler can still
//! find its coordinates and refresh it in place without a new geocode lookup.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::Utc;
use lru::LruCache;
use tracing::debug;

use crate::config::ApiVersion;
use crate::error::SdkError;
use crate::provider::{Coordinates, WeatherPayload};

/// Normalizes a city key: trimmed, inner whitespace collapsed, lowercased
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One cached weather snapshot for a city
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Normalized city key
    pub key: String,
    /// Coordinates the snapshot was fetched for
    pub coordinates: Coordinates,
    /// Raw provider payload; the store never inspects it
    pub payload: WeatherPayload,
    /// API schema that produced the payload
    pub api_version: ApiVersion,
    /// When the payload was fetched, in milliseconds since the Unix epoch.
    /// Non-decreasing across successive writes for the same key.
    pub fetched_at: i64,
}

impl CacheEntry {
    /// Whether the snapshot is still within TTL at `now_ms`
    ///
    /// Strict inequality: an entry whose age equals the TTL is expired.
    pub fn is_valid(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.fetched_at < ttl_ms
    }
}

/// Thread-safe, capacity-bounded store of weather snapshots
///
/// All operations are atomic with respect to concurrent callers; per-key
/// reads and writes are linearized by the inner mutex, and `keys()` returns
/// a snapshot that is safe to iterate while the store keeps mutating.
#[derive(Debug)]
pub struct WeatherStore {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl_ms: i64,
}

impl WeatherStore {
    /// Creates a store holding at most `max_size` entries valid for
    /// `ttl_minutes` after each write
    pub fn new(max_size: usize, ttl_minutes: u64) -> Result<Self, SdkError> {
        let capacity = NonZeroUsize::new(max_size)
            .ok_or_else(|| SdkError::InvalidInput("cache size must be positive".to_string()))?;
        if ttl_minutes == 0 {
            return Err(SdkError::InvalidInput(
                "cache TTL must be positive".to_string(),
            ));
        }

        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl_ms: ttl_minutes as i64 * 60_000,
        })
    }

    /// Returns the entry for `city` if present and still valid
    ///
    /// Expired entries are reported absent but not evicted. A successful read
    /// promotes the entry to most-recently-used; a read that finds an expired
    /// entry does not.
    pub fn get(&self, city: &str) -> Option<CacheEntry> {
        self.get_at(city, Utc::now().timestamp_millis())
    }

    fn get_at(&self, city: &str, now_ms: i64) -> Option<CacheEntry> {
        let key = normalize_key(city);
        if key.is_empty() {
            return None;
        }

        let mut entries = self.entries.lock().expect("weather store lock poisoned");
        let valid = entries
            .peek(&key)
            .map(|e| e.is_valid(now_ms, self.ttl_ms))?;
        if !valid {
            return None;
        }
        entries.get(&key).cloned()
    }

    /// Inserts or overwrites the entry for `city`, evicting the
    /// least-recently-used entry if the store is full
    pub fn put(
        &self,
        city: &str,
        coordinates: Coordinates,
        payload: WeatherPayload,
        api_version: ApiVersion,
        fetched_at: i64,
    ) -> Result<(), SdkError> {
        let key = normalize_key(city);
        if key.is_empty() {
            return Err(SdkError::InvalidInput(
                "city name cannot be blank".to_string(),
            ));
        }

        let mut entries = self.entries.lock().expect("weather store lock poisoned");

        // A write never back-dates an existing entry
        let fetched_at = match entries.peek(&key) {
            Some(existing) => fetched_at.max(existing.fetched_at),
            None => fetched_at,
        };

        let entry = CacheEntry {
            key: key.clone(),
            coordinates,
            payload,
            api_version,
            fetched_at,
        };

        if let Some((evicted_key, _)) = entries.push(key.clone(), entry) {
            if evicted_key != key {
                debug!(city = %evicted_key, "Evicted least-recently-used cache entry");
            }
        }
        debug!(city = %key, fetched_at, "Cache entry stored");
        Ok(())
    }

    /// Updates an existing entry's payload, version, and timestamp in place,
    /// preserving its coordinates
    ///
    /// Fails with `NotFound` if the key is absent: a background refresh must
    /// never create entries. Counts as an access for eviction ordering.
    pub fn refresh(
        &self,
        city: &str,
        payload: WeatherPayload,
        api_version: ApiVersion,
        fetched_at: i64,
    ) -> Result<(), SdkError> {
        let key = normalize_key(city);
        if key.is_empty() {
            return Err(SdkError::InvalidInput(
                "city name cannot be blank".to_string(),
            ));
        }

        let mut entries = self.entries.lock().expect("weather store lock poisoned");
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| SdkError::NotFound(format!("no cache entry for city: {key}")))?;

        entry.payload = payload;
        entry.api_version = api_version;
        entry.fetched_at = fetched_at.max(entry.fetched_at);
        debug!(city = %key, fetched_at = entry.fetched_at, "Cache entry refreshed");
        Ok(())
    }

    /// Whether `city` has a valid entry right now; does not promote
    pub fn is_valid(&self, city: &str) -> bool {
        self.is_valid_at(city, Utc::now().timestamp_millis())
    }

    pub(crate) fn is_valid_at(&self, city: &str, now_ms: i64) -> bool {
        self.remaining_ttl_at(city, now_ms)
            .map(|remaining| remaining > 0)
            .unwrap_or(false)
    }

    /// Milliseconds of freshness left for `city`, or `None` if absent
    ///
    /// Zero or negative means the entry is expired. This is the single place
    /// TTL arithmetic lives; validity checks elsewhere delegate here.
    pub(crate) fn remaining_ttl_at(&self, city: &str, now_ms: i64) -> Option<i64> {
        let key = normalize_key(city);
        let entries = self.entries.lock().expect("weather store lock poisoned");
        entries
            .peek(&key)
            .map(|e| self.ttl_ms - (now_ms - e.fetched_at))
    }

    /// Coordinates stored for `city`, valid or not; does not promote
    pub fn coordinates(&self, city: &str) -> Option<Coordinates> {
        let key = normalize_key(city);
        let entries = self.entries.lock().expect("weather store lock poisoned");
        entries.peek(&key).map(|e| e.coordinates)
    }

    /// When the entry for `city` was last written, valid or not; does not
    /// promote
    pub fn fetched_at(&self, city: &str) -> Option<i64> {
        let key = normalize_key(city);
        let entries = self.entries.lock().expect("weather store lock poisoned");
        entries.peek(&key).map(|e| e.fetched_at)
    }

    /// Removes the entry for `city`, if any
    pub fn remove(&self, city: &str) {
        let key = normalize_key(city);
        if key.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().expect("weather store lock poisoned");
        if entries.pop(&key).is_some() {
            debug!(city = %key, "Cache entry removed");
        }
    }

    /// Removes all entries
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("weather store lock poisoned");
        entries.clear();
        debug!("Cache cleared");
    }

    /// Snapshot of all cached keys, most recently used first
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("weather store lock poisoned");
        entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.lock().expect("weather store lock poisoned").len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
