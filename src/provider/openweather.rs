//! OpenWeather current-weather client
//!
//! Fetches current conditions for a set of coordinates from either the
//! Current Weather Data API 2.5 or the One Call API 3.0, depending on
//! configuration. Every request passes through the shared rate limiter
//! before touching the network.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ApiVersion, SdkConfig, Units};
use crate::error::SdkError;
use crate::limiter::ApiRateLimiter;
use crate::provider::{map_status_error, Coordinates, WeatherPayload, WeatherProvider};

const DEFAULT_V25_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const DEFAULT_V30_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Only current conditions are cached; forecast blocks are dead weight
const V30_EXCLUDE: &str = "minutely,hourly,daily,alerts";

/// Weather client backed by the OpenWeather APIs
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
    limiter: Arc<ApiRateLimiter>,
    version: ApiVersion,
    units: Units,
    lang: Option<String>,
    v25_url: String,
    v30_url: String,
}

impl OpenWeatherClient {
    /// Creates a client from the SDK configuration
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        limiter: Arc<ApiRateLimiter>,
        config: &SdkConfig,
    ) -> Self {
        Self {
            http,
            api_key,
            limiter,
            version: config.api_version,
            units: config.units,
            lang: config.lang.clone(),
            v25_url: DEFAULT_V25_URL.to_string(),
            v30_url: DEFAULT_V30_URL.to_string(),
        }
    }

    /// Overrides the upstream endpoints, for tests
    #[cfg(test)]
    pub(crate) fn with_urls(mut self, v25_url: String, v30_url: String) -> Self {
        self.v25_url = v25_url;
        self.v30_url = v30_url;
        self
    }

    fn endpoint(&self) -> &str {
        match self.version {
            ApiVersion::V25 => &self.v25_url,
            ApiVersion::V30 => &self.v30_url,
        }
    }

    /// Query string for the configured API version
    fn query_params(&self, coordinates: Coordinates) -> Vec<(String, String)> {
        let mut params = vec![
            ("lat".to_string(), coordinates.lat.to_string()),
            ("lon".to_string(), coordinates.lon.to_string()),
            ("appid".to_string(), self.api_key.clone()),
        ];
        if self.version == ApiVersion::V30 {
            params.push(("exclude".to_string(), V30_EXCLUDE.to_string()));
        }
        if let Some(units) = self.units.as_query_param() {
            params.push(("units".to_string(), units.to_string()));
        }
        if let Some(lang) = &self.lang {
            params.push(("lang".to_string(), lang.clone()));
        }
        params
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherPayload, SdkError> {
        self.limiter.acquire()?;

        let response = self
            .http
            .get(self.endpoint())
            .query(&self.query_params(coordinates))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error("Weather API", status.as_u16(), &body));
        }

        let payload = match self.version {
            ApiVersion::V25 => WeatherPayload::V25(response.json().await?),
            ApiVersion::V30 => WeatherPayload::V30(response.json().await?),
        };

        debug!(
            lat = coordinates.lat,
            lon = coordinates.lon,
            version = ?self.version,
            "Weather fetched"
        );
        Ok(payload)
    }

    fn version(&self) -> ApiVersion {
        self.version
    }
}
