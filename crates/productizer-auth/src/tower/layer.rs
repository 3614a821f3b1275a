//! Tower Layer implementation for API token verification

use tower::Layer;

use super::ApiTokenLayerConfig;
use super::service::ApiTokenService;
use crate::jwt::TokenValidator;

/// Tower Layer that adds API token verification to services
///
/// The validator is shared by every service the layer produces, and with it
/// the discovery, JWKS and key caches.
#[derive(Debug, Clone)]
pub struct ApiTokenLayer {
    validator: TokenValidator,
    config: ApiTokenLayerConfig,
}

impl ApiTokenLayer {
    /// Create a new layer with default configuration
    pub fn new(validator: TokenValidator) -> Self {
        Self {
            validator,
            config: ApiTokenLayerConfig::default(),
        }
    }

    /// Create a new layer with custom configuration
    pub fn with_config(validator: TokenValidator, config: ApiTokenLayerConfig) -> Self {
        Self { validator, config }
    }

    /// Let requests without a token pass through
    #[must_use]
    pub fn allow_anonymous(mut self) -> Self {
        self.config.allow_anonymous = true;
        self
    }
}

impl<S> Layer<S> for ApiTokenLayer {
    type Service = ApiTokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiTokenService::new(inner, self.validator.clone(), self.config.clone())
    }
}
