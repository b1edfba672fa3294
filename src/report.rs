//! Normalized weather response model
//!
//! `WeatherReport` is what SDK users receive from `get_weather`, regardless
//! of which OpenWeather API version produced the underlying payload. Fields
//! the upstream omitted stay `None` rather than being invented.

use serde::{Deserialize, Serialize};

/// Weather data for one city, normalized across API versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Weather condition (group name and human-readable description)
    pub weather: Option<ConditionInfo>,
    /// Temperature readings in the configured units
    pub temperature: TemperatureInfo,
    /// Visibility in meters
    pub visibility: Option<u32>,
    /// Wind readings
    pub wind: Option<WindInfo>,
    /// Observation time as a Unix timestamp (UTC seconds)
    pub datetime: Option<i64>,
    /// Sunrise and sunset times
    pub sys: Option<SunInfo>,
    /// Timezone offset from UTC in seconds
    pub timezone_offset: Option<i32>,
    /// City name the report was requested for
    pub city: String,
}

/// Weather condition information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInfo {
    /// Condition group, e.g. "Clear", "Rain"
    pub main: Option<String>,
    /// Human-readable description, e.g. "light rain"
    pub description: Option<String>,
}

/// Temperature information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureInfo {
    /// Actual temperature
    pub temp: Option<f64>,
    /// Perceived temperature
    pub feels_like: Option<f64>,
}

/// Wind information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindInfo {
    /// Wind speed in the configured units
    pub speed: Option<f64>,
}

/// Sunrise and sunset as Unix timestamps (UTC seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunInfo {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}
