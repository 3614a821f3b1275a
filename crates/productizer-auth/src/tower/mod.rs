//! # Tower Middleware for API Token Verification
//!
//! [`ApiTokenLayer`] wraps an HTTP service with [`ApiTokenService`], which
//! validates the API token of each request against the DSI of the requested
//! data product before forwarding it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use productizer_auth::tower::ApiTokenLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ApiTokenLayer::new(validator))
//!     .service(my_inner_service);
//! ```
//!
//! ## Request Extensions
//!
//! On success the [`VerifiedClaims`](crate::VerifiedClaims) are inserted into
//! the request's extensions:
//!
//! ```rust,ignore
//! if let Some(claims) = req.extensions().get::<VerifiedClaims>() {
//!     println!("Request from: {}", claims.sub);
//! }
//! ```

mod layer;
mod service;

pub use layer::ApiTokenLayer;
pub use service::{ApiTokenService, ApiTokenServiceFuture};

/// Configuration for the API token layer
#[derive(Debug, Clone)]
pub struct ApiTokenLayerConfig {
    /// Whether requests without a token pass through unverified
    pub allow_anonymous: bool,
    /// Header carrying the API token (default: "X-API-Key")
    pub api_key_header: String,
    /// Query parameter carrying the source (default: "source")
    pub source_param: String,
}

impl Default for ApiTokenLayerConfig {
    fn default() -> Self {
        Self {
            allow_anonymous: false,
            api_key_header: "X-API-Key".to_string(),
            source_param: "source".to_string(),
        }
    }
}

impl ApiTokenLayerConfig {
    /// Create a new config that lets requests without a token through
    #[must_use]
    pub fn allow_anonymous() -> Self {
        Self {
            allow_anonymous: true,
            ..Default::default()
        }
    }

    /// Set the API key header name
    #[must_use]
    pub fn api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    /// Set the source query parameter name
    #[must_use]
    pub fn source_param(mut self, param: impl Into<String>) -> Self {
        self.source_param = param.into();
        self
    }
}
