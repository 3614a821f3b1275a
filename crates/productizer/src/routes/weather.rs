//! `Weather/Current/Metric` data product

use axum::{Extension, Json, extract::State};
use productizer_auth::VerifiedClaims;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::error::ApiError;
use crate::openweathermap::CurrentWeather;

/// Request body
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherMetricRequest {
    /// Latitude in degrees, -90 to 90
    pub lat: f64,
    /// Longitude in degrees, -180 to 180
    pub lon: f64,
}

impl CurrentWeatherMetricRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ApiError::InvalidRequest(format!(
                "lat {} out of range",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(ApiError::InvalidRequest(format!(
                "lon {} out of range",
                self.lon
            )));
        }
        Ok(())
    }
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherMetricResponse {
    /// Relative humidity in %
    pub humidity: f64,
    /// Air pressure in hPa
    pub pressure: f64,
    /// Whether it is raining
    pub rain: bool,
    /// Temperature in Celsius
    pub temp: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
}

impl From<CurrentWeather> for CurrentWeatherMetricResponse {
    fn from(weather: CurrentWeather) -> Self {
        Self {
            humidity: weather.humidity,
            pressure: weather.pressure,
            rain: weather.rain,
            temp: weather.temp,
            wind_speed: weather.wind_speed,
            wind_direction: weather.wind_direction,
        }
    }
}

/// Current weather at the requested coordinates
pub async fn weather_handler(
    State(state): State<AppState>,
    claims: Option<Extension<VerifiedClaims>>,
    Json(request): Json<CurrentWeatherMetricRequest>,
) -> Result<Json<CurrentWeatherMetricResponse>, ApiError> {
    request.validate()?;

    if let Some(Extension(claims)) = &claims {
        info!(sub = %claims.sub, aud = %claims.aud, "Serving data product");
    }

    let weather = state
        .weather
        .current_weather(request.lat, request.lon)
        .await?;
    Ok(Json(weather.into()))
}
