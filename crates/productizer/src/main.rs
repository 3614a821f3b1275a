//! Productizer server binary

use std::sync::Arc;

use anyhow::Context;
use productizer::openweathermap::OpenWeatherMap;
use productizer::routes::{AppState, router};
use productizer::{AppConfig, TelemetryGuard};
use productizer_auth::TokenValidator;
use productizer_auth::tower::{ApiTokenLayer, ApiTokenLayerConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let _telemetry = TelemetryGuard::init(config.telemetry.clone())?;

    let validator =
        TokenValidator::new(config.auth.clone()).context("Failed to build token validator")?;
    let layer_config = ApiTokenLayerConfig {
        allow_anonymous: !config.require_api_token,
        ..ApiTokenLayerConfig::default()
    };
    if layer_config.allow_anonymous {
        warn!("API tokens are optional; set require_api_token to enforce them");
    }

    let weather = OpenWeatherMap::new(&config.weather)?;
    let app = router(
        AppState::new(Arc::new(weather)),
        ApiTokenLayer::with_config(validator, layer_config),
    );

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        %addr,
        trusted_dataspaces = ?config.auth.trusted_dataspaces,
        "Productizer listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
