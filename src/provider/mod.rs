//! Upstream provider collaborators
//!
//! The SDK core talks to OpenWeather through two seams: a geocoding resolver
//! that turns city names into coordinates, and a weather provider that turns
//! coordinates into a raw payload. Both are traits so tests can substitute
//! fakes, with `reqwest`-backed implementations for the real APIs.

pub mod geocoding;
pub mod openweather;
mod payload;

pub use geocoding::GeocodingClient;
pub use openweather::OpenWeatherClient;
pub use payload::{WeatherPayload, WeatherV25, WeatherV30};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ApiVersion;
use crate::error::SdkError;

/// Geographic coordinates of a city
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, -90..=90
    pub lat: f64,
    /// Longitude in degrees, -180..=180
    pub lon: f64,
}

impl Coordinates {
    /// Creates coordinates, rejecting out-of-range or non-finite values
    pub fn new(lat: f64, lon: f64) -> Result<Self, SdkError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(SdkError::InvalidInput(format!(
                "latitude out of range: {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(SdkError::InvalidInput(format!(
                "longitude out of range: {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Resolves a city name to coordinates
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Resolves the given city name
    ///
    /// Fails with `NotFound` for unknown cities, `RateLimited` when quotas
    /// are hit, `BadRequest`/`Unauthorized` for request problems, and
    /// `Network` for transport failures.
    async fn resolve(&self, city: &str) -> Result<Coordinates, SdkError>;
}

/// Fetches weather for a set of coordinates
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches the current weather payload; same error taxonomy as
    /// [`GeocodingProvider::resolve`]
    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherPayload, SdkError>;

    /// Which API schema this provider's payloads carry
    fn version(&self) -> ApiVersion;
}

/// Maps an upstream HTTP error response to the SDK error taxonomy
///
/// OpenWeather error bodies carry a `message` field; it is surfaced when
/// present, with the raw body as fallback.
pub(crate) fn map_status_error(api_label: &str, status: u16, body: &str) -> SdkError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str().map(String::from)))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        400 => SdkError::BadRequest(format!("{api_label}: {message}")),
        401 => SdkError::Unauthorized(format!("{api_label}: {message}")),
        404 => SdkError::NotFound(format!("{api_label}: {message}")),
        429 => SdkError::RateLimited(format!("{api_label}: {message}")),
        s if s >= 500 => SdkError::Network(format!("{api_label} server error ({s}): {message}")),
        s => SdkError::Network(format!("{api_label} error ({s}): {message}")),
    }
}
