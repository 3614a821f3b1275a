//! HTTP routes
//!
//! - `GET /health`
//! - `POST /Weather/Current/Metric` behind the API token layer

mod health;
mod weather;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use productizer_auth::tower::ApiTokenLayer;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::openweathermap::WeatherProvider;

pub use health::health_handler;
pub use weather::{CurrentWeatherMetricRequest, CurrentWeatherMetricResponse, weather_handler};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upstream weather source
    pub weather: Arc<dyn WeatherProvider>,
}

impl AppState {
    /// Create state around a weather provider
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self { weather }
    }
}

/// Build the service router
///
/// Only the data product route is wrapped by `auth`; health checks stay open.
pub fn router(state: AppState, auth: ApiTokenLayer) -> Router {
    Router::new()
        .route("/Weather/Current/Metric", post(weather_handler))
        .route_layer(auth)
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
