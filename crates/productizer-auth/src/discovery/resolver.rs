//! Dataspace configuration resolver
//!
//! Maps a dataspace base domain to the JWKS URL announced in its
//! well-known dataspace configuration. Results are cached per domain; the
//! configuration is near-static, so the default TTL is a day.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use url::Url;

use super::types::{DATASPACE_CONFIGURATION_PATH, DataspaceConfiguration};
use crate::cache::StageCache;
use crate::error::{AuthError, AuthResult};
use crate::http::{HttpFetch, get_json};

/// Resolves and caches JWKS URLs per dataspace domain
#[derive(Debug, Clone)]
pub struct DataspaceResolver {
    http: Arc<dyn HttpFetch>,
    cache: StageCache<String, String>,
}

impl DataspaceResolver {
    /// Create a resolver with its own cache
    pub fn new(http: Arc<dyn HttpFetch>, ttl: Duration, capacity: u64) -> Self {
        Self {
            http,
            cache: StageCache::new("dataspace-configuration", ttl, capacity),
        }
    }

    /// Determine the JWKS URL of a dataspace
    ///
    /// Fetches `https://{domain}/.well-known/dataspace/dataspace-configuration.json`
    /// on a cache miss; at most one fetch per domain is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Discovery`] if the domain does not form a valid
    /// origin, the document cannot be fetched (timeout, non-2xx) or it lacks
    /// the JWKS URL.
    pub async fn resolve_jwks_url(&self, domain: &str) -> AuthResult<String> {
        let http = Arc::clone(&self.http);
        let owned = domain.to_string();

        self.cache
            .get_or_fill(
                domain.to_string(),
                async move { fetch_jwks_url(http.as_ref(), &owned).await },
            )
            .await
            .map_err(|e| {
                e.or_aborted(|reason| {
                    AuthError::discovery(domain, format!("fetch aborted: {reason}"))
                })
            })
    }

    /// Drop the cached JWKS URL for `domain`
    pub async fn invalidate(&self, domain: &str) {
        self.cache.invalidate(&domain.to_string()).await;
    }
}

/// Build the dataspace configuration URL for a base domain
///
/// Only HTTPS is supported. The domain must be a bare host name: anything
/// that would add userinfo, a port, a path or a query is rejected.
///
/// # Errors
///
/// Returns [`AuthError::Discovery`] if `domain` is not a bare host name.
pub fn dataspace_configuration_url(domain: &str) -> AuthResult<Url> {
    let mut url = Url::parse(&format!("https://{domain}"))
        .map_err(|e| AuthError::discovery(domain, format!("invalid dataspace domain: {e}")))?;

    let bare_host = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(domain))
        && url.port().is_none()
        && url.username().is_empty()
        && url.password().is_none()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none();

    if !bare_host {
        return Err(AuthError::discovery(
            domain,
            "dataspace domain must be a bare host name",
        ));
    }

    url.set_path(DATASPACE_CONFIGURATION_PATH);
    Ok(url)
}

async fn fetch_jwks_url(http: &dyn HttpFetch, domain: &str) -> AuthResult<String> {
    let url = dataspace_configuration_url(domain)?;

    info!(domain = domain, url = %url, "Fetching dataspace configuration");

    let configuration: DataspaceConfiguration =
        get_json(http, url.as_str()).await.map_err(|e| {
            error!(domain = domain, url = %url, error = %e, "Dataspace configuration fetch failed");
            AuthError::discovery(domain, e)
        })?;

    if configuration.jwks_uri.trim().is_empty() {
        return Err(AuthError::discovery(
            domain,
            "dataspace configuration has an empty jwks_uri",
        ));
    }

    info!(
        domain = domain,
        jwks_url = %configuration.jwks_uri,
        dataspace_name = ?configuration.dataspace_name,
        "Resolved JWKS URL"
    );

    Ok(configuration.jwks_uri)
}
