//! Skycast: an OpenWeatherMap client SDK with freshness maintenance
//!
//! Weather reads are cache-first: a snapshot stays valid for a configurable
//! TTL, capacity is bounded with LRU eviction, and all upstream traffic is
//! jointly rate limited. In polling mode a background task keeps cached
//! cities fresh so reads rarely touch the network at all.
//!
//! ```no_run
//! use skycast::{SdkConfig, SdkMode, WeatherSdk};
//!
//! # async fn run() -> Result<(), skycast::SdkError> {
//! let sdk = WeatherSdk::new(None, SdkMode::OnDemand, SdkConfig::default())?;
//! let report = sdk.get_weather("Vancouver").await?;
//! println!("{:?} at {}", report.temperature.temp, report.city);
//! sdk.destroy().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod sdk;

pub use cache::{CacheEntry, WeatherStore};
pub use config::{ApiVersion, PollingStrategy, SdkConfig, SdkMode, Units};
pub use error::SdkError;
pub use limiter::ApiRateLimiter;
pub use provider::{Coordinates, GeocodingProvider, WeatherPayload, WeatherProvider};
pub use registry::SdkRegistry;
pub use report::WeatherReport;
pub use scheduler::{PollingScheduler, TickStats};
pub use sdk::WeatherSdk;
