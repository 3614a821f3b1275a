//! OpenWeatherMap client
//!
//! See <https://openweathermap.org/current#current_JSON> for the upstream
//! response format and <https://openweathermap.org/weather-conditions> for
//! the condition groups.

use std::fmt::Debug;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::WeatherConfig;

/// Offset between Kelvin and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// Upstream weather errors
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The request failed before a response arrived
    #[error("Weather request failed: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status
    #[error("OpenWeatherMap error {status}")]
    Status {
        /// Upstream status code
        status: u16,
    },

    /// The upstream body was not a current weather document
    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),
}

/// Current weather at one location, metric units
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Relative humidity in %
    pub humidity: f64,
    /// Air pressure in hPa
    pub pressure: f64,
    /// Whether it is raining (rain, drizzle or sleet)
    pub rain: bool,
    /// Temperature in Celsius
    pub temp: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Meteorological wind direction in degrees
    pub wind_direction: f64,
}

/// Source of current weather
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current weather at (`lat`, `lon`)
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<CurrentWeather, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

impl From<OwmCurrent> for CurrentWeather {
    fn from(current: OwmCurrent) -> Self {
        let rain = current.weather.first().is_some_and(|condition| {
            let main = condition.main.to_lowercase();
            ["rain", "drizzle", "sleet"]
                .iter()
                .any(|kind| main.contains(kind))
        });

        Self {
            humidity: current.main.humidity,
            pressure: current.main.pressure,
            rain,
            temp: current.main.temp - KELVIN_OFFSET,
            wind_speed: current.wind.speed,
            wind_direction: current.wind.deg,
        }
    }
}

/// OpenWeatherMap current weather API
#[derive(Debug, Clone)]
pub struct OpenWeatherMap {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl OpenWeatherMap {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<CurrentWeather, WeatherError> {
        debug!(lat, lon, "Fetching current weather");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.expose_secret().clone()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "OpenWeatherMap error");
            return Err(WeatherError::Status {
                status: status.as_u16(),
            });
        }

        let current: OwmCurrent = response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidResponse(e.without_url().to_string()))?;

        debug!(lat, lon, weather = ?current, "Current weather");
        Ok(current.into())
    }
}
