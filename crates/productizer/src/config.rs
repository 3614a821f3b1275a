//! Service configuration
//!
//! Loaded from an optional file layered under `PRODUCTIZER_*` environment
//! variables (`__` separates nested keys, e.g. `PRODUCTIZER_AUTH__LEEWAY_SECS`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use productizer_auth::ValidatorConfig;
use secrecy::SecretString;
use serde::Deserialize;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PRODUCTIZER";

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "PRODUCTIZER_CONFIG";

/// Default configuration file stem (`productizer.toml`, `.yaml`, `.json`)
pub const DEFAULT_CONFIG_FILE: &str = "productizer";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Explicitly named config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),
}

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address to listen on
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Reject data product requests without an API token
    pub require_api_token: bool,
    /// API token verification
    pub auth: ValidatorConfig,
    /// Upstream weather API
    pub weather: WeatherConfig,
    /// Logging
    pub telemetry: TelemetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            require_api_token: false,
            auth: ValidatorConfig::default(),
            weather: WeatherConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// Reads the file named by `PRODUCTIZER_CONFIG`, which must exist, or
    /// else `productizer.{toml,yaml,json}` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file is missing or any source is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Self::build(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        }
    }

    /// Load configuration from a file, with environment overrides
    ///
    /// The format is detected from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or contains invalid
    /// configuration.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path));
        }
        Self::build(File::from(path))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.trusted_dataspaces")
                    .with_list_parse_key("auth.allowed_dsis")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Socket address to listen on
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// OpenWeatherMap settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Current weather endpoint
    pub api_endpoint: String,
    /// API key (`appid`)
    pub api_key: SecretString,
    /// Upstream request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            api_key: SecretString::new(String::new()),
            timeout_secs: 30,
        }
    }
}

impl WeatherConfig {
    /// Upstream request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
