//! SDK configuration
//!
//! `SdkConfig` carries every tunable the SDK honors: API quotas, HTTP
//! timeouts, cache geometry, polling behavior, and the upstream API flavor.
//! Values are validated once at construction and never silently clamped;
//! an invalid value fails SDK creation immediately.

use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// SDK operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdkMode {
    /// Weather is fetched from the API only when requested; cached data is
    /// returned while it is still within TTL
    OnDemand,
    /// A background scheduler keeps cached cities fresh at a fixed cadence,
    /// so requests are usually served from cache with zero upstream calls
    Polling,
}

/// Strategy for deciding which cached cities a polling tick refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollingStrategy {
    /// Refresh every cached city on each tick
    Strict,
    /// Refresh only entries whose TTL has already elapsed
    ExpiredOnly,
    /// Refresh once remaining freshness drops to or below epsilon;
    /// with epsilon 0 this behaves exactly like `ExpiredOnly`
    PreemptiveEpsilon,
}

/// OpenWeather API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVersion {
    /// Current Weather Data API 2.5, compatible with all API keys
    V25,
    /// One Call API 3.0, requires a "One Call by Call" subscription
    V30,
}

/// Units for temperature and wind speed in API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    /// Kelvin / meters per second (API default)
    Standard,
    /// Celsius / meters per second
    Metric,
    /// Fahrenheit / miles per hour
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter, or `None` for the API default
    pub fn as_query_param(&self) -> Option<&'static str> {
        match self {
            Units::Standard => None,
            Units::Metric => Some("metric"),
            Units::Imperial => Some("imperial"),
        }
    }
}

/// Configuration for an SDK instance
///
/// Immutable once validated. Defaults match the OpenWeather free-tier quotas
/// and the cache geometry the SDK was designed around (10 cities, 10-minute
/// freshness).
#[derive(Debug, Clone, PartialEq)]
pub struct SdkConfig {
    /// Maximum number of API calls per day
    pub max_calls_per_day: u32,
    /// Maximum number of API calls in any trailing 60 seconds
    pub max_calls_per_minute: u32,
    /// Whole-request timeout for upstream HTTP calls, in seconds
    pub request_timeout_secs: u64,
    /// Connection-establishment timeout for upstream HTTP calls, in seconds
    pub connect_timeout_secs: u64,
    /// Maximum number of cities kept in the cache
    pub cache_size: usize,
    /// How long a cached snapshot stays valid, in minutes
    pub cache_ttl_minutes: u64,
    /// Delay between polling ticks, in minutes
    pub polling_interval_minutes: u64,
    /// Which cached cities a polling tick refreshes
    pub polling_strategy: PollingStrategy,
    /// Freshness margin for `PreemptiveEpsilon`, in minutes; ignored otherwise
    pub preemptive_epsilon_minutes: u64,
    /// Upstream API flavor to fetch weather from
    pub api_version: ApiVersion,
    /// Units for temperature and wind speed
    pub units: Units,
    /// Language code for weather descriptions (API default when unset)
    pub lang: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            max_calls_per_day: 2000,
            max_calls_per_minute: 60,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            cache_size: 10,
            cache_ttl_minutes: 10,
            polling_interval_minutes: 10,
            polling_strategy: PollingStrategy::Strict,
            preemptive_epsilon_minutes: 1,
            api_version: ApiVersion::V30,
            units: Units::Standard,
            lang: None,
        }
    }
}

impl SdkConfig {
    /// Sets the daily call quota
    pub fn with_max_calls_per_day(mut self, max: u32) -> Self {
        self.max_calls_per_day = max;
        self
    }

    /// Sets the per-minute call quota
    pub fn with_max_calls_per_minute(mut self, max: u32) -> Self {
        self.max_calls_per_minute = max;
        self
    }

    /// Sets the cache capacity in cities
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Sets the cache TTL in minutes
    pub fn with_cache_ttl_minutes(mut self, minutes: u64) -> Self {
        self.cache_ttl_minutes = minutes;
        self
    }

    /// Sets the polling interval in minutes
    pub fn with_polling_interval_minutes(mut self, minutes: u64) -> Self {
        self.polling_interval_minutes = minutes;
        self
    }

    /// Sets the polling strategy
    pub fn with_polling_strategy(mut self, strategy: PollingStrategy) -> Self {
        self.polling_strategy = strategy;
        self
    }

    /// Sets the preemptive epsilon in minutes
    pub fn with_preemptive_epsilon_minutes(mut self, minutes: u64) -> Self {
        self.preemptive_epsilon_minutes = minutes;
        self
    }

    /// Sets the API version
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Sets the response units
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Sets the language for weather descriptions
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Cache TTL as milliseconds
    pub fn cache_ttl_millis(&self) -> i64 {
        self.cache_ttl_minutes as i64 * 60_000
    }

    /// Preemptive epsilon as milliseconds
    pub fn preemptive_epsilon_millis(&self) -> i64 {
        self.preemptive_epsilon_minutes as i64 * 60_000
    }

    /// Validates all configuration values
    ///
    /// Every quota, timeout, size, and interval must be positive; epsilon may
    /// be zero. Returns `InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.max_calls_per_day == 0 {
            return Err(SdkError::InvalidInput(
                "max_calls_per_day must be positive".to_string(),
            ));
        }
        if self.max_calls_per_minute == 0 {
            return Err(SdkError::InvalidInput(
                "max_calls_per_minute must be positive".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SdkError::InvalidInput(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(SdkError::InvalidInput(
                "connect_timeout_secs must be positive".to_string(),
            ));
        }
        if self.cache_size == 0 {
            return Err(SdkError::InvalidInput(
                "cache_size must be positive".to_string(),
            ));
        }
        if self.cache_ttl_minutes == 0 {
            return Err(SdkError::InvalidInput(
                "cache_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.polling_interval_minutes == 0 {
            return Err(SdkError::InvalidInput(
                "polling_interval_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Polling parameters owned by a scheduler instance
///
/// Derived from `SdkConfig` at SDK construction; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Delay between the start of one tick and the start of the next
    pub interval: std::time::Duration,
    /// Cache TTL in milliseconds
    pub ttl_millis: i64,
    /// Refresh-decision strategy
    pub strategy: PollingStrategy,
    /// Freshness margin in milliseconds for `PreemptiveEpsilon`
    pub epsilon_millis: i64,
}

impl PollingConfig {
    /// Extracts the polling parameters from a validated SDK configuration
    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self {
            interval: std::time::Duration::from_secs(config.polling_interval_minutes * 60),
            ttl_millis: config.cache_ttl_millis(),
            strategy: config.polling_strategy,
            epsilon_millis: config.preemptive_epsilon_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SdkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_calls_per_day, 2000);
        assert_eq!(config.max_calls_per_minute, 60);
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.cache_ttl_minutes, 10);
        assert_eq!(config.polling_strategy, PollingStrategy::Strict);
        assert_eq!(config.api_version, ApiVersion::V30);
    }

    #[test]
    fn test_builder_methods_chain() {
        let config = SdkConfig::default()
            .with_cache_size(5)
            .with_cache_ttl_minutes(2)
            .with_polling_strategy(PollingStrategy::ExpiredOnly)
            .with_api_version(ApiVersion::V25)
            .with_units(Units::Metric)
            .with_lang("ru");

        assert_eq!(config.cache_size, 5);
        assert_eq!(config.cache_ttl_minutes, 2);
        assert_eq!(config.polling_strategy, PollingStrategy::ExpiredOnly);
        assert_eq!(config.api_version, ApiVersion::V25);
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.lang.as_deref(), Some("ru"));
    }

    #[test]
    fn test_validate_rejects_each_zero_field() {
        let cases = [
            SdkConfig::default().with_max_calls_per_day(0),
            SdkConfig::default().with_max_calls_per_minute(0),
            SdkConfig::default().with_cache_size(0),
            SdkConfig::default().with_cache_ttl_minutes(0),
            SdkConfig::default().with_polling_interval_minutes(0),
            SdkConfig {
                request_timeout_secs: 0,
                ..SdkConfig::default()
            },
            SdkConfig {
                connect_timeout_secs: 0,
                ..SdkConfig::default()
            },
        ];

        for config in cases {
            match config.validate() {
                Err(SdkError::InvalidInput(_)) => {}
                other => panic!("Expected InvalidInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_epsilon_is_allowed() {
        let config = SdkConfig::default().with_preemptive_epsilon_minutes(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_units_query_params() {
        assert_eq!(Units::Standard.as_query_param(), None);
        assert_eq!(Units::Metric.as_query_param(), Some("metric"));
        assert_eq!(Units::Imperial.as_query_param(), Some("imperial"));
    }

    #[test]
    fn test_polling_config_conversion() {
        let config = SdkConfig::default()
            .with_polling_interval_minutes(3)
            .with_cache_ttl_minutes(7)
            .with_preemptive_epsilon_minutes(2);
        let polling = PollingConfig::from_sdk_config(&config);

        assert_eq!(polling.interval, std::time::Duration::from_secs(180));
        assert_eq!(polling.ttl_millis, 7 * 60_000);
        assert_eq!(polling.epsilon_millis, 2 * 60_000);
        assert_eq!(polling.strategy, PollingStrategy::Strict);
    }
}
