//! Signing key selection
//!
//! Picks the one key in a dataspace's key set that may verify a token with a
//! given `kid`: RSA, use `sig`, alg `RS256`. Selections are cached per
//! `(domain, kid)` with a short TTL.
//!
//! A `kid` that is not in the cached key set may belong to a key the
//! dataspace rotated in after the set was cached. In that case the key set
//! is refetched once and the selection retried. Forced refetches are limited
//! to one per domain per `min_refetch_interval`, so tokens with random key IDs
//! cannot turn into unbounded JWKS traffic.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::DecodingKey;
use moka::future::Cache;
use tracing::{debug, warn};

use super::jwks::{FetchedKeySet, Jwk, JwksFetcher};
use crate::cache::{FillError, StageCache};
use crate::error::{AuthError, AuthResult};

/// The key that verifies tokens with a given `kid`
#[derive(Clone)]
pub struct SelectedKey {
    /// JWKS URL the key came from
    pub jwks_url: String,
    /// The key as published
    pub jwk: Jwk,
    decoding_key: DecodingKey,
}

impl SelectedKey {
    /// Public key for signature verification
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for SelectedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedKey")
            .field("jwks_url", &self.jwks_url)
            .field("jwk", &self.jwk)
            .finish_non_exhaustive()
    }
}

/// Settings for forced key-set refetches on unknown key IDs
#[derive(Debug, Clone, Copy)]
pub struct RefetchPolicy {
    /// Refetch the key set when a `kid` is not found
    pub enabled: bool,
    /// Minimum time between forced refetches for one domain
    pub min_interval: Duration,
}

/// Selects and caches signing keys per `(domain, kid)`
#[derive(Clone)]
pub struct KeySelector {
    fetcher: JwksFetcher,
    cache: StageCache<(String, String), Arc<SelectedKey>>,
    refetches: Option<Cache<String, ()>>,
}

impl fmt::Debug for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySelector")
            .field("fetcher", &self.fetcher)
            .field("cache", &self.cache)
            .field("refetch_on_unknown_kid", &self.refetches.is_some())
            .finish()
    }
}

impl KeySelector {
    /// Create a selector on top of `fetcher`, with its own cache
    pub fn new(fetcher: JwksFetcher, ttl: Duration, capacity: u64, refetch: RefetchPolicy) -> Self {
        let refetches = refetch.enabled.then(|| {
            Cache::builder()
                .name("jwks-refetch")
                .max_capacity(capacity)
                .time_to_live(refetch.min_interval)
                .build()
        });

        Self {
            fetcher,
            cache: StageCache::new("signing-key", ttl, capacity),
            refetches,
        }
    }

    /// Select the signing key with ID `kid` from the key set of `domain`
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError::Discovery`] and [`AuthError::KeySetFetch`].
    /// Returns [`AuthError::KeyNotFound`] unless exactly one RS256 signature
    /// key has the ID `kid`, and [`AuthError::KeySetFetch`] if that key's RSA
    /// components are unusable.
    pub async fn select_key(&self, domain: &str, kid: &str) -> AuthResult<Arc<SelectedKey>> {
        match self.cached_select(domain, kid).await {
            Err(AuthError::KeyNotFound { jwks_url, .. }) if self.begin_refetch(domain).await => {
                warn!(
                    domain = domain,
                    kid = kid,
                    jwks_url = %jwks_url,
                    "Key not found in cached JWKS, refetching"
                );
                self.fetcher.refresh(domain).await?;
                self.cached_select(domain, kid).await
            }
            result => result,
        }
    }

    /// The fetcher this selector uses
    pub fn fetcher(&self) -> &JwksFetcher {
        &self.fetcher
    }

    async fn cached_select(&self, domain: &str, kid: &str) -> AuthResult<Arc<SelectedKey>> {
        let fetcher = self.fetcher.clone();
        let (owned_domain, owned_kid) = (domain.to_string(), kid.to_string());

        let result = self
            .cache
            .get_or_fill((domain.to_string(), kid.to_string()), async move {
                let key_set = fetcher.fetch_keys(&owned_domain).await?;
                select_from(&key_set, &owned_kid).map(Arc::new)
            })
            .await;

        match result {
            Ok(key) => Ok(key),
            Err(FillError::Failed(e)) => Err(e),
            Err(FillError::Aborted(reason)) => {
                let jwks_url = self.fetcher.resolver().resolve_jwks_url(domain).await?;
                Err(AuthError::key_set_fetch(
                    &jwks_url,
                    format!("key selection aborted: {reason}"),
                ))
            }
        }
    }

    /// Returns `true` if a forced refetch for `domain` may start now
    async fn begin_refetch(&self, domain: &str) -> bool {
        let Some(refetches) = &self.refetches else {
            return false;
        };

        let allowed = refetches
            .entry(domain.to_string())
            .or_insert(())
            .await
            .is_fresh();

        if !allowed {
            debug!(domain = domain, "JWKS refetch rate-limited");
        }
        allowed
    }
}

/// Pick the single RS256 signature key with ID `kid`
fn select_from(key_set: &FetchedKeySet, kid: &str) -> AuthResult<SelectedKey> {
    let mut matches = key_set
        .keys
        .keys
        .iter()
        .filter(|jwk| jwk.is_rs256_signing_key() && jwk.kid.as_deref() == Some(kid));

    let (jwk, extra) = (matches.next(), matches.count());
    let jwk = match jwk {
        Some(jwk) if extra == 0 => jwk,
        first => {
            return Err(AuthError::KeyNotFound {
                jwks_url: key_set.jwks_url.clone(),
                kid: kid.to_string(),
                matches: usize::from(first.is_some()) + extra,
            });
        }
    };

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        return Err(AuthError::key_set_fetch(
            &key_set.jwks_url,
            format!("key {kid} lacks RSA modulus or exponent"),
        ));
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
        AuthError::key_set_fetch(
            &key_set.jwks_url,
            format!("key {kid} is not a valid RSA key: {err}"),
        )
    })?;

    Ok(SelectedKey {
        jwks_url: key_set.jwks_url.clone(),
        jwk: jwk.clone(),
        decoding_key,
    })
}
