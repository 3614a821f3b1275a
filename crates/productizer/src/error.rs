//! HTTP errors returned by the data product routes

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::openweathermap::WeatherError;

/// Data product route errors
///
/// Causes are logged, never returned to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upstream weather API failed
    #[error("Upstream weather API failed: {0}")]
    Upstream(#[from] WeatherError),
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), error = %self, "Data product request failed");

        let detail = status.canonical_reason().unwrap_or("Error");
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidRequest("lat".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(WeatherError::Status { status: 401 }).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_response_hides_cause() {
        let response =
            ApiError::from(WeatherError::Transport("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
