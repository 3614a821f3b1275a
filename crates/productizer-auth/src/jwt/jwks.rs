//! JWKS (JSON Web Key Set) fetching and caching
//!
//! The key set of a dataspace is found through its dataspace configuration
//! (see [`DataspaceResolver`]) and cached per domain. Key sets rotate on a
//! human timescale, so the default TTL is an hour.
//!
//! # Security Considerations
//!
//! - HTTPS required for JWKS endpoints (prevents MITM)
//! - A failed fetch is never cached, so a dataspace outage does not pin an
//!   empty key set
//! - See [`KeySelector`](super::KeySelector) for refetching on unknown keys

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use crate::cache::{FillError, StageCache};
use crate::discovery::DataspaceResolver;
use crate::error::{AuthError, AuthResult};
use crate::http::{HttpFetch, get_json};

/// A JSON Web Key (RFC 7517)
///
/// Only `kty` is mandatory so key sets that also publish non-RSA keys still
/// parse; the selector decides which keys are usable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    /// Key type (e.g., "RSA")
    pub kty: String,
    /// Key use (e.g., "sig")
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm (e.g., "RS256")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Modulus (Base64URL encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// Exponent (Base64URL encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Permitted key operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    /// X.509 certificate chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    /// X.509 certificate SHA-1 thumbprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// X.509 certificate URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,
}

impl Jwk {
    /// Whether this is an RSA signature key for RS256
    #[must_use]
    pub fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && self.key_use.as_deref() == Some("sig")
            && self.alg.as_deref() == Some("RS256")
    }
}

/// A JSON Web Key Set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwkSet {
    /// List of keys.
    pub keys: Vec<Jwk>,
}

/// Key set of one dataspace at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedKeySet {
    /// URL the set was fetched from
    pub jwks_url: String,
    /// The keys
    pub keys: JwkSet,
}

/// Fetches and caches key sets per dataspace domain
#[derive(Debug, Clone)]
pub struct JwksFetcher {
    resolver: DataspaceResolver,
    http: Arc<dyn HttpFetch>,
    cache: StageCache<String, Arc<FetchedKeySet>>,
}

impl JwksFetcher {
    /// Create a fetcher on top of `resolver`, with its own cache
    pub fn new(
        resolver: DataspaceResolver,
        http: Arc<dyn HttpFetch>,
        ttl: Duration,
        capacity: u64,
    ) -> Self {
        Self {
            resolver,
            http,
            cache: StageCache::new("jwks", ttl, capacity),
        }
    }

    /// Get the key set of a dataspace (from cache or fetch if needed)
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError::Discovery`] from the resolver. Returns
    /// [`AuthError::KeySetFetch`] if the JWKS URL is not HTTPS or the document
    /// cannot be fetched or parsed.
    pub async fn fetch_keys(&self, domain: &str) -> AuthResult<Arc<FetchedKeySet>> {
        let this = self.clone();
        let owned = domain.to_string();

        let result = self
            .cache
            .get_or_fill(
                domain.to_string(),
                async move { this.fetch_uncached(&owned).await.map(Arc::new) },
            )
            .await;

        match result {
            Ok(key_set) => Ok(key_set),
            Err(FillError::Failed(e)) => Err(e),
            Err(FillError::Aborted(reason)) => {
                let jwks_url = self.resolver.resolve_jwks_url(domain).await?;
                Err(AuthError::key_set_fetch(
                    &jwks_url,
                    format!("JWKS fetch aborted: {reason}"),
                ))
            }
        }
    }

    /// Drop the cached key set of `domain` and fetch it again
    ///
    /// Use this when a token names a key the cached set does not contain -
    /// the key may have been rotated in.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_keys`](Self::fetch_keys).
    pub async fn refresh(&self, domain: &str) -> AuthResult<Arc<FetchedKeySet>> {
        self.cache.invalidate(&domain.to_string()).await;
        self.fetch_keys(domain).await
    }

    /// The resolver this fetcher uses
    pub fn resolver(&self) -> &DataspaceResolver {
        &self.resolver
    }

    async fn fetch_uncached(&self, domain: &str) -> AuthResult<FetchedKeySet> {
        let jwks_url = self.resolver.resolve_jwks_url(domain).await?;

        // Validate HTTPS
        let parsed = Url::parse(&jwks_url)
            .map_err(|e| AuthError::key_set_fetch(&jwks_url, format!("invalid URL: {e}")))?;
        if parsed.scheme() != "https" {
            return Err(AuthError::key_set_fetch(
                &jwks_url,
                "JWKS endpoint must use HTTPS",
            ));
        }

        info!(domain = domain, jwks_url = %jwks_url, "Fetching JWKS");

        let keys: JwkSet = get_json(self.http.as_ref(), &jwks_url).await.map_err(|e| {
            error!(domain = domain, jwks_url = %jwks_url, error = %e, "Failed to fetch JWKS");
            AuthError::key_set_fetch(&jwks_url, e)
        })?;

        info!(
            domain = domain,
            jwks_url = %jwks_url,
            key_count = keys.keys.len(),
            "Successfully fetched JWKS"
        );

        Ok(FetchedKeySet { jwks_url, keys })
    }
}
