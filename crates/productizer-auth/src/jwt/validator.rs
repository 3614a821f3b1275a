//! API token validator
//!
//! Orchestrates the pipeline for one request: unverified hints, issuer
//! allow-list, expected DSI, key resolution, RS256 verification, expiry and
//! the audience check. All caching lives in the resolution stages.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, TokenData, Validation, decode};
use tracing::{debug, info, warn};

use super::claims::UnverifiedToken;
use super::jwks::JwksFetcher;
use super::selector::{KeySelector, RefetchPolicy};
use super::{ApiTokenClaims, VerifiedClaims};
use crate::clock::{Clock, SystemClock};
use crate::config::ValidatorConfig;
use crate::discovery::DataspaceResolver;
use crate::dsi::build_dsi;
use crate::error::{AuthError, AuthResult};
use crate::http::{FetchError, HttpFetch, ReqwestFetcher};

/// Claims the verified payload must carry
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "sub", "aud"];

/// Validates dataspace API tokens for data product requests
///
/// Cheap to clone; clones share the caches.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    config: Arc<ValidatorConfig>,
    selector: KeySelector,
    clock: Arc<dyn Clock>,
}

impl TokenValidator {
    /// Create a validator that fetches over HTTPS with `reqwest`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ValidatorConfig) -> Result<Self, FetchError> {
        let http = ReqwestFetcher::new(config.request_timeout(), config.max_response_bytes)?;
        Ok(Self::with_http(config, Arc::new(http)))
    }

    /// Create a validator on top of a custom [`HttpFetch`]
    pub fn with_http(config: ValidatorConfig, http: Arc<dyn HttpFetch>) -> Self {
        let cache = &config.cache;
        let resolver =
            DataspaceResolver::new(Arc::clone(&http), cache.discovery_ttl(), cache.capacity);
        let fetcher = JwksFetcher::new(resolver, http, cache.key_set_ttl(), cache.capacity);
        let selector = KeySelector::new(
            fetcher,
            cache.key_ttl(),
            cache.capacity,
            RefetchPolicy {
                enabled: config.refetch_on_unknown_kid,
                min_interval: config.min_refetch_interval(),
            },
        );

        Self {
            config: Arc::new(config),
            selector,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for the expiry check
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration this validator was built with
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The key selector (and through it the fetcher and resolver)
    pub fn selector(&self) -> &KeySelector {
        &self.selector
    }

    /// Validate an API token for a request to `resource_path` with `source`
    ///
    /// # Errors
    ///
    /// Returns the first failing check as an [`AuthError`]. Resolution errors
    /// ([`AuthError::Discovery`], [`AuthError::KeySetFetch`],
    /// [`AuthError::KeyNotFound`]) are passed through unchanged.
    pub async fn validate(
        &self,
        token: &str,
        resource_path: &str,
        source: &str,
    ) -> AuthResult<VerifiedClaims> {
        let result = self.validate_inner(token, resource_path, source).await;

        match &result {
            Ok(claims) => info!(
                sub = %claims.sub,
                iss = %claims.iss,
                aud = %claims.aud,
                kid = %claims.kid(),
                "Verified API token"
            ),
            Err(e) => warn!(
                kind = %e.kind(),
                error = %e,
                resource_path = resource_path,
                "API token rejected"
            ),
        }

        result
    }

    async fn validate_inner(
        &self,
        token: &str,
        resource_path: &str,
        source: &str,
    ) -> AuthResult<VerifiedClaims> {
        let UnverifiedToken { kid, issuer } = UnverifiedToken::parse(token)?;

        let domain = issuer.strip_prefix("https://").unwrap_or(&issuer);
        if !self.config.is_trusted(domain) {
            return Err(AuthError::UntrustedIssuer {
                issuer: issuer.clone(),
                trusted: self.config.trusted_dataspaces.iter().cloned().collect(),
            });
        }

        let expected_dsi = build_dsi(domain, resource_path, source);
        debug!(domain = domain, kid = %kid, dsi = %expected_dsi, "Expected DSI");

        if !self.config.allowed_dsis.is_empty() && !self.config.allowed_dsis.contains(&expected_dsi)
        {
            return Err(AuthError::DisallowedResource { dsi: expected_dsi });
        }

        let key = self.selector.select_key(domain, &kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = self.config.leeway_secs;
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);

        // Expiry is checked below against the injected clock
        let TokenData { claims, .. } =
            decode::<ApiTokenClaims>(token, key.decoding_key(), &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::Signature(e.to_string()),
                    _ => AuthError::malformed(format!("Could not verify API token: {e}")),
                }
            })?;

        // Inclusive: a token is still valid exactly `leeway` seconds past exp
        let now = self.clock.now();
        if claims.exp.saturating_add(self.config.leeway_secs) < now {
            return Err(AuthError::TokenExpired {
                exp: claims.exp,
                now,
                leeway: self.config.leeway_secs,
            });
        }

        if claims.aud != expected_dsi {
            return Err(AuthError::AudienceMismatch {
                expected: expected_dsi,
                actual: claims.aud,
            });
        }

        Ok(VerifiedClaims::new(claims, kid, key.jwks_url.clone()))
    }
}
