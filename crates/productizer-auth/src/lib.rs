//! # Productizer Auth - Dataspace API Token Verification
//!
//! Verifies the API tokens that dataspaces issue for data product requests.
//! A token is accepted only if it was issued by a trusted dataspace, signed
//! by a key that dataspace publishes, is not expired, and names the exact
//! data product (DSI) being requested as its audience.
//!
//! ## Architecture
//!
//! - [`discovery`] - Dataspace configuration lookup (domain → JWKS URL)
//! - [`jwt`] - JWKS fetching, key selection and the [`TokenValidator`]
//! - [`dsi`] - Data source identifier construction
//! - [`config`] - [`ValidatorConfig`] with trusted dataspaces and cache TTLs
//! - [`http`] - The [`HttpFetch`] seam and its `reqwest` implementation
//! - [`tower`] - Tower middleware (feature `middleware`)
//!
//! Each resolution stage has its own TTL + LRU cache with single-flight
//! fills, so concurrent requests for a cold dataspace share one fetch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use productizer_auth::{TokenValidator, ValidatorConfig};
//!
//! # tokio_test::block_on(async {
//! let validator = TokenValidator::new(ValidatorConfig::for_dataspaces(["testbed.fi"]))?;
//!
//! match validator.validate("eyJ0eXAi...", "/Weather/Current/Metric", "").await {
//!     Ok(claims) => println!("Valid token for: {}", claims.sub),
//!     Err(e) => println!("Rejected ({}): {}", e.status_code(), e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ## Feature Flags
//!
//! - `middleware` (default) - [`tower::ApiTokenLayer`]

#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod dsi;
pub mod error;
pub mod http;
pub mod jwt;

#[cfg(feature = "middleware")]
#[cfg_attr(docsrs, doc(cfg(feature = "middleware")))]
pub mod tower;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CacheConfig, ValidatorConfig};
pub use discovery::{DataspaceConfiguration, DataspaceResolver};
pub use dsi::build_dsi;
pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use http::{FetchError, HttpFetch, HttpResponse, ReqwestFetcher};
pub use jwt::{
    ApiTokenClaims, Jwk, JwkSet, JwksFetcher, KeySelector, TokenValidator, VerifiedClaims,
    extract_issuer, extract_kid,
};
