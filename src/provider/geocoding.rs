//! OpenWeather geocoding client
//!
//! Turns city names into coordinates via the Geocoding API, with a small
//! in-process memo so repeated lookups for the same city do not burn API
//! quota. Geocoding results move rarely, so memo entries live for a day.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::cache::normalize_key;
use crate::error::SdkError;
use crate::limiter::ApiRateLimiter;
use crate::provider::{map_status_error, Coordinates, GeocodingProvider};

const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/geo/1.0";

/// Memoized geocoding results stay usable for 24 hours
const MEMO_TTL_MS: i64 = 24 * 60 * 60 * 1000;
const MEMO_MAX_ENTRIES: usize = 100;

/// One entry of the geocoding response array
#[derive(Debug, Deserialize)]
struct GeoResult {
    lat: f64,
    lon: f64,
}

/// Geocoding client backed by the OpenWeather Geocoding API
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<ApiRateLimiter>,
    /// Normalized city name to (coordinates, resolved-at millis)
    memo: Mutex<HashMap<String, (Coordinates, i64)>>,
}

impl GeocodingClient {
    /// Creates a client that shares the given HTTP client and rate limiter
    pub fn new(http: reqwest::Client, api_key: String, limiter: Arc<ApiRateLimiter>) -> Self {
        Self::with_base_url(http, api_key, limiter, DEFAULT_BASE_URL.to_string())
    }

    /// Same as [`new`](Self::new) with an overridable endpoint, for tests
    pub fn with_base_url(
        http: reqwest::Client,
        api_key: String,
        limiter: Arc<ApiRateLimiter>,
        base_url: String,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            limiter,
            memo: Mutex::new(HashMap::new()),
        }
    }

    fn memo_lookup(&self, city: &str, now_ms: i64) -> Option<Coordinates> {
        let memo = self.memo.lock().expect("geocoding memo lock poisoned");
        memo.get(city)
            .filter(|(_, resolved_at)| now_ms - resolved_at < MEMO_TTL_MS)
            .map(|(coordinates, _)| *coordinates)
    }

    fn memo_insert(&self, city: String, coordinates: Coordinates, now_ms: i64) {
        let mut memo = self.memo.lock().expect("geocoding memo lock poisoned");
        memo.retain(|_, (_, resolved_at)| now_ms - *resolved_at < MEMO_TTL_MS);
        if memo.len() >= MEMO_MAX_ENTRIES {
            // Full of still-valid entries; drop the oldest one
            if let Some(oldest) = memo
                .iter()
                .min_by_key(|(_, (_, resolved_at))| *resolved_at)
                .map(|(key, _)| key.clone())
            {
                memo.remove(&oldest);
            }
        }
        memo.insert(city, (coordinates, now_ms));
    }
}

#[async_trait]
impl GeocodingProvider for GeocodingClient {
    async fn resolve(&self, city: &str) -> Result<Coordinates, SdkError> {
        let key = normalize_key(city);
        if key.is_empty() {
            return Err(SdkError::InvalidInput(
                "city name must not be blank".to_string(),
            ));
        }

        let now_ms = Utc::now().timestamp_millis();
        if let Some(coordinates) = self.memo_lookup(&key, now_ms) {
            debug!(city = %key, "Geocoding served from memo");
            return Ok(coordinates);
        }

        self.limiter.acquire()?;

        let url = format!("{}/direct", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", key.as_str()), ("limit", "1")])
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error("Geocoding API", status.as_u16(), &body));
        }

        let results: Vec<GeoResult> = response.json().await?;
        let coordinates = first_coordinates(results, &key)?;

        debug!(city = %key, lat = coordinates.lat, lon = coordinates.lon, "City resolved");
        self.memo_insert(key, coordinates, now_ms);
        Ok(coordinates)
    }
}

/// Picks the first geocoding result and validates its coordinates
fn first_coordinates(results: Vec<GeoResult>, city: &str) -> Result<Coordinates, SdkError> {
    let first = results
        .into_iter()
        .next()
        .ok_or_else(|| SdkError::NotFound(format!("city not found: {city}")))?;
    Coordinates::new(first.lat, first.lon)
}
