//! # productizer
//!
//! `Weather/Current/Metric` data product for IOXIO-style dataspaces.
//!
//! Requests to the data product carry a dataspace-issued API token in the
//! `X-API-Key` header. Tokens are verified with [`productizer_auth`] before
//! the OpenWeatherMap API is queried.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use productizer::config::AppConfig;
//! use productizer::openweathermap::OpenWeatherMap;
//! use productizer::routes::{AppState, router};
//! use productizer_auth::TokenValidator;
//! use productizer_auth::tower::ApiTokenLayer;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::load()?;
//! let validator = TokenValidator::new(config.auth.clone())?;
//! let weather = Arc::new(OpenWeatherMap::new(&config.weather)?);
//!
//! let app = router(AppState::new(weather), ApiTokenLayer::new(validator));
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod openweathermap;
pub mod routes;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use openweathermap::{CurrentWeather, OpenWeatherMap, WeatherError, WeatherProvider};
pub use routes::{AppState, router};
pub use telemetry::{TelemetryError, TelemetryGuard};
