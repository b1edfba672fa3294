//! Weather SDK facade
//!
//! `WeatherSdk` wires the cache, rate limiter, providers, and (in polling
//! mode) the background scheduler together behind one entry point. Reads go
//! cache-first: a valid snapshot is returned with zero upstream calls, and a
//! miss walks geocode, fetch, store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::{normalize_key, WeatherStore};
use crate::config::{PollingConfig, SdkConfig, SdkMode};
use crate::error::SdkError;
use crate::limiter::ApiRateLimiter;
use crate::provider::{GeocodingClient, GeocodingProvider, OpenWeatherClient, WeatherProvider};
use crate::report::WeatherReport;
use crate::scheduler::PollingScheduler;

/// Environment variable consulted when no API key is passed explicitly
pub const API_KEY_ENV_VAR: &str = "OPENWEATHER_API_KEY";

/// An OpenWeather SDK instance
///
/// Construct with [`WeatherSdk::new`]; in [`SdkMode::Polling`] the instance
/// owns a background refresh task, so it must be created and destroyed inside
/// a tokio runtime. After [`destroy`](Self::destroy) every weather call fails
/// with `IllegalState`.
pub struct WeatherSdk {
    api_key: String,
    mode: SdkMode,
    store: Arc<WeatherStore>,
    limiter: Arc<ApiRateLimiter>,
    geocoder: Arc<dyn GeocodingProvider>,
    weather: Arc<dyn WeatherProvider>,
    scheduler: Option<PollingScheduler>,
    destroyed: AtomicBool,
}

impl WeatherSdk {
    /// Creates an SDK instance
    ///
    /// The API key comes from `api_key`, falling back to the
    /// `OPENWEATHER_API_KEY` environment variable; with neither set, creation
    /// fails with `Unauthorized`. The configuration is validated up front.
    /// In polling mode the background scheduler starts immediately.
    pub fn new(
        api_key: Option<&str>,
        mode: SdkMode,
        config: SdkConfig,
    ) -> Result<Self, SdkError> {
        let api_key = resolve_api_key(api_key, std::env::var(API_KEY_ENV_VAR).ok())?;
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SdkError::unexpected("failed to build HTTP client", e))?;

        let limiter = Arc::new(ApiRateLimiter::new(
            config.max_calls_per_day,
            config.max_calls_per_minute,
        )?);
        let geocoder = Arc::new(GeocodingClient::new(
            http.clone(),
            api_key.clone(),
            Arc::clone(&limiter),
        ));
        let weather = Arc::new(OpenWeatherClient::new(
            http,
            api_key.clone(),
            Arc::clone(&limiter),
            &config,
        ));

        Self::assemble(api_key, mode, config, limiter, geocoder, weather)
    }

    /// Creates an SDK instance over caller-supplied providers
    ///
    /// Used by tests to substitute fakes for the HTTP clients; the cache,
    /// limiter, and scheduler behave exactly as in [`new`](Self::new).
    pub fn with_providers(
        api_key: &str,
        mode: SdkMode,
        config: SdkConfig,
        geocoder: Arc<dyn GeocodingProvider>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Result<Self, SdkError> {
        config.validate()?;
        let limiter = Arc::new(ApiRateLimiter::new(
            config.max_calls_per_day,
            config.max_calls_per_minute,
        )?);
        Self::assemble(api_key.to_string(), mode, config, limiter, geocoder, weather)
    }

    fn assemble(
        api_key: String,
        mode: SdkMode,
        config: SdkConfig,
        limiter: Arc<ApiRateLimiter>,
        geocoder: Arc<dyn GeocodingProvider>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Result<Self, SdkError> {
        let store = Arc::new(WeatherStore::new(
            config.cache_size,
            config.cache_ttl_minutes,
        )?);

        let scheduler = match mode {
            SdkMode::OnDemand => None,
            SdkMode::Polling => {
                let scheduler = PollingScheduler::new(
                    Arc::clone(&store),
                    Arc::clone(&weather),
                    PollingConfig::from_sdk_config(&config),
                );
                scheduler.start();
                Some(scheduler)
            }
        };

        info!(
            mode = ?mode,
            api_version = ?config.api_version,
            cache_size = config.cache_size,
            ttl_minutes = config.cache_ttl_minutes,
            "Weather SDK created"
        );

        Ok(Self {
            api_key,
            mode,
            store,
            limiter,
            geocoder,
            weather,
            scheduler,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Returns current weather for `city`
    ///
    /// Served from cache while the snapshot is within TTL; otherwise the city
    /// is resolved to coordinates (reusing the cached ones when an expired
    /// entry still holds them), fresh weather is fetched, and the cache is
    /// updated before the report is returned.
    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport, SdkError> {
        self.ensure_active()?;

        let key = normalize_key(city);
        if key.is_empty() {
            return Err(SdkError::InvalidInput(
                "city name must not be blank".to_string(),
            ));
        }

        if let Some(entry) = self.store.get(&key) {
            debug!(city = %key, "Weather served from cache");
            return Ok(entry.payload.to_report(&entry.key));
        }

        let coordinates = match self.store.coordinates(&key) {
            Some(coordinates) => coordinates,
            None => self.geocoder.resolve(&key).await?,
        };

        let payload = self.weather.fetch(coordinates).await?;
        let version = self.weather.version();
        self.store.put(
            &key,
            coordinates,
            payload.clone(),
            version,
            Utc::now().timestamp_millis(),
        )?;

        Ok(payload.to_report(&key))
    }

    /// The mode this instance was created in
    pub fn mode(&self) -> SdkMode {
        self.mode
    }

    /// Number of cities currently cached, valid or expired
    pub fn cache_size(&self) -> usize {
        self.store.len()
    }

    /// Whether `city` currently has a valid cached snapshot
    pub fn is_cached(&self, city: &str) -> bool {
        self.store.is_valid(city)
    }

    /// Number of API calls counted against today's quota
    pub fn calls_today(&self) -> u32 {
        self.limiter.calls_today()
    }

    /// The API key with everything past the first four characters hidden
    pub fn masked_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }

    /// Tears the instance down: stops the polling scheduler (if any) and
    /// clears the cache. Idempotent; afterwards every weather call fails
    /// with `IllegalState`.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop().await;
        }
        self.store.clear();
        info!("Weather SDK destroyed");
    }

    /// Whether `destroy()` has been called
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<(), SdkError> {
        if self.is_destroyed() {
            return Err(SdkError::IllegalState(
                "SDK instance has been destroyed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Picks the API key: an explicit non-blank key wins, then the environment
fn resolve_api_key(explicit: Option<&str>, from_env: Option<String>) -> Result<String, SdkError> {
    if let Some(key) = explicit {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    if let Some(key) = from_env {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }
    Err(SdkError::Unauthorized(format!(
        "no API key provided and {API_KEY_ENV_VAR} is not set"
    )))
}

/// Keeps the first four characters visible, hides the rest
fn mask_api_key(key: &str) -> String {
    if key.chars().count() <= 4 {
        return "****".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}****")
}
