//! Raw weather payloads from the OpenWeather APIs
//!
//! The cache stores payloads opaquely; the tagged `WeatherPayload` union
//! carries which schema produced the data and knows how to project itself
//! into the normalized [`WeatherReport`](crate::report::WeatherReport),
//! so nothing downstream ever inspects payload internals.

use serde::{Deserialize, Serialize};

use crate::config::ApiVersion;
use crate::report::{ConditionInfo, SunInfo, TemperatureInfo, WeatherReport, WindInfo};

/// A fetched weather payload, tagged with the API schema that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WeatherPayload {
    /// Current Weather Data API 2.5 response
    V25(WeatherV25),
    /// One Call API 3.0 response
    V30(WeatherV30),
}

impl WeatherPayload {
    /// Which API schema this payload carries
    pub fn api_version(&self) -> ApiVersion {
        match self {
            WeatherPayload::V25(_) => ApiVersion::V25,
            WeatherPayload::V30(_) => ApiVersion::V30,
        }
    }

    /// Projects the payload into the normalized report model
    pub fn to_report(&self, city: &str) -> WeatherReport {
        match self {
            WeatherPayload::V25(data) => data.to_report(city),
            WeatherPayload::V30(data) => data.to_report(city),
        }
    }
}

/// Weather condition element, identical in both API schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub main: Option<String>,
    pub description: Option<String>,
}

/// Current Weather Data API 2.5 response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherV25 {
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Option<MainV25>,
    pub visibility: Option<u32>,
    pub wind: Option<WindV25>,
    /// Observation time, Unix seconds UTC
    pub dt: Option<i64>,
    pub sys: Option<SysV25>,
    /// Timezone offset from UTC in seconds
    pub timezone: Option<i32>,
    /// City name as the API knows it
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainV25 {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<i32>,
    pub humidity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindV25 {
    pub speed: Option<f64>,
    pub deg: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysV25 {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub country: Option<String>,
}

impl WeatherV25 {
    fn to_report(&self, city: &str) -> WeatherReport {
        let weather = self.weather.first().map(|c| ConditionInfo {
            main: c.main.clone(),
            description: c.description.clone(),
        });

        let temperature = TemperatureInfo {
            temp: self.main.as_ref().and_then(|m| m.temp),
            feels_like: self.main.as_ref().and_then(|m| m.feels_like),
        };

        let wind = self.wind.as_ref().map(|w| WindInfo { speed: w.speed });

        let sys = self.sys.as_ref().map(|s| SunInfo {
            sunrise: s.sunrise,
            sunset: s.sunset,
        });

        // v2.5 echoes the canonical city name; prefer it over the raw query
        let city = self.name.clone().unwrap_or_else(|| city.to_string());

        WeatherReport {
            weather,
            temperature,
            visibility: self.visibility,
            wind,
            datetime: self.dt,
            sys,
            timezone_offset: self.timezone,
            city,
        }
    }
}

/// One Call API 3.0 response body (current conditions only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherV30 {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i32>,
    pub current: Option<CurrentV30>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentV30 {
    /// Observation time, Unix seconds UTC
    pub dt: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<i32>,
    pub humidity: Option<i32>,
    pub visibility: Option<u32>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<i32>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

impl WeatherV30 {
    fn to_report(&self, city: &str) -> WeatherReport {
        let current = self.current.as_ref();

        let weather = current
            .and_then(|c| c.weather.first())
            .map(|c| ConditionInfo {
                main: c.main.clone(),
                description: c.description.clone(),
            });

        let temperature = TemperatureInfo {
            temp: current.and_then(|c| c.temp),
            feels_like: current.and_then(|c| c.feels_like),
        };

        let wind = current.map(|c| WindInfo { speed: c.wind_speed });

        let sys = current.map(|c| SunInfo {
            sunrise: c.sunrise,
            sunset: c.sunset,
        });

        WeatherReport {
            weather,
            temperature,
            visibility: current.and_then(|c| c.visibility),
            wind,
            datetime: current.and_then(|c| c.dt),
            sys,
            timezone_offset: self.timezone_offset,
            city: city.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample Current Weather Data API 2.5 response
    const V25_RESPONSE: &str = r#"{
        "coord": {"lon": -0.1257, "lat": 51.5085},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "base": "stations",
        "main": {"temp": 281.75, "feels_like": 279.92, "temp_min": 280.6, "temp_max": 282.62,
                 "pressure": 1032, "humidity": 82},
        "visibility": 10000,
        "wind": {"speed": 3.09, "deg": 240},
        "clouds": {"all": 75},
        "dt": 1700000000,
        "sys": {"type": 2, "id": 2075535, "country": "GB", "sunrise": 1699970521, "sunset": 1700003205},
        "timezone": 0,
        "id": 2643743,
        "name": "London",
        "cod": 200
    }"#;

    /// Sample One Call API 3.0 response (minutely/hourly/daily excluded)
    const V30_RESPONSE: &str = r#"{
        "lat": 51.5085,
        "lon": -0.1257,
        "timezone": "Europe/London",
        "timezone_offset": 0,
        "current": {
            "dt": 1700000000,
            "sunrise": 1699970521,
            "sunset": 1700003205,
            "temp": 281.75,
            "feels_like": 279.92,
            "pressure": 1032,
            "humidity": 82,
            "dew_point": 278.93,
            "uvi": 0.3,
            "clouds": 75,
            "visibility": 10000,
            "wind_speed": 3.09,
            "wind_deg": 240,
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
        }
    }"#;

    #[test]
    fn test_v25_payload_parses_and_normalizes() {
        let data: WeatherV25 = serde_json::from_str(V25_RESPONSE).expect("Failed to parse v2.5");
        let payload = WeatherPayload::V25(data);

        assert_eq!(payload.api_version(), ApiVersion::V25);

        let report = payload.to_report("london");
        assert_eq!(report.city, "London");
        assert_eq!(report.weather.as_ref().unwrap().main.as_deref(), Some("Clouds"));
        assert_eq!(report.temperature.temp, Some(281.75));
        assert_eq!(report.temperature.feels_like, Some(279.92));
        assert_eq!(report.visibility, Some(10000));
        assert_eq!(report.wind.as_ref().unwrap().speed, Some(3.09));
        assert_eq!(report.datetime, Some(1_700_000_000));
        assert_eq!(report.sys.as_ref().unwrap().sunrise, Some(1_699_970_521));
        assert_eq!(report.timezone_offset, Some(0));
    }

    #[test]
    fn test_v30_payload_parses_and_normalizes() {
        let data: WeatherV30 = serde_json::from_str(V30_RESPONSE).expect("Failed to parse v3.0");
        let payload = WeatherPayload::V30(data);

        assert_eq!(payload.api_version(), ApiVersion::V30);

        let report = payload.to_report("London");
        assert_eq!(report.city, "London");
        assert_eq!(
            report.weather.as_ref().unwrap().description.as_deref(),
            Some("broken clouds")
        );
        assert_eq!(report.temperature.temp, Some(281.75));
        assert_eq!(report.wind.as_ref().unwrap().speed, Some(3.09));
        assert_eq!(report.sys.as_ref().unwrap().sunset, Some(1_700_003_205));
        assert_eq!(report.timezone_offset, Some(0));
    }

    #[test]
    fn test_both_versions_produce_equivalent_core_fields() {
        let v25: WeatherV25 = serde_json::from_str(V25_RESPONSE).expect("Failed to parse v2.5");
        let v30: WeatherV30 = serde_json::from_str(V30_RESPONSE).expect("Failed to parse v3.0");

        let r25 = WeatherPayload::V25(v25).to_report("London");
        let r30 = WeatherPayload::V30(v30).to_report("London");

        assert_eq!(r25.temperature, r30.temperature);
        assert_eq!(r25.weather, r30.weather);
        assert_eq!(r25.wind, r30.wind);
        assert_eq!(r25.sys, r30.sys);
        assert_eq!(r25.datetime, r30.datetime);
    }

    #[test]
    fn test_v30_without_current_block_yields_sparse_report() {
        let data: WeatherV30 =
            serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0}"#).expect("Failed to parse");
        let report = WeatherPayload::V30(data).to_report("Nowhere");

        assert!(report.weather.is_none());
        assert!(report.temperature.temp.is_none());
        assert!(report.sys.is_none());
        assert_eq!(report.city, "Nowhere");
    }

    #[test]
    fn test_payload_survives_cache_serialization() {
        let data: WeatherV25 = serde_json::from_str(V25_RESPONSE).expect("Failed to parse v2.5");
        let payload = WeatherPayload::V25(data);

        let json = serde_json::to_string(&payload).expect("Failed to serialize payload");
        let back: WeatherPayload = serde_json::from_str(&json).expect("Failed to deserialize");

        assert_eq!(back.api_version(), ApiVersion::V25);
        assert_eq!(back.to_report("x").temperature.temp, Some(281.75));
    }
}
