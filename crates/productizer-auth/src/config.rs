//! Validator configuration
//!
//! All fields have defaults so an empty configuration source deserializes
//! into a working validator for the public IOXIO dataspaces.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`TokenValidator`](crate::TokenValidator)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Dataspace base domains whose tokens are accepted, i.e. where the data
    /// source has been published
    pub trusted_dataspaces: BTreeSet<String>,
    /// DSIs this data product publishes. Empty disables the check.
    pub allowed_dsis: BTreeSet<String>,
    /// Clock-skew tolerance applied to `exp`, in seconds
    pub leeway_secs: u64,
    /// Per-stage cache settings
    pub cache: CacheConfig,
    /// Timeout for every outbound discovery/JWKS request, in seconds
    pub request_timeout_secs: u64,
    /// Upper bound on a discovery/JWKS response body
    pub max_response_bytes: usize,
    /// Force one key-set refetch when a token names an unknown `kid`
    pub refetch_on_unknown_kid: bool,
    /// Minimum time between forced refetches for one dataspace, in seconds
    pub min_refetch_interval_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            trusted_dataspaces: ["sandbox.ioxio-dataspace.com", "testbed.fi"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_dsis: BTreeSet::new(),
            // Default token lifetime is 1h, so 60s covers drift and delays
            leeway_secs: 60,
            cache: CacheConfig::default(),
            request_timeout_secs: 10,
            max_response_bytes: 256 * 1024,
            refetch_on_unknown_kid: true,
            min_refetch_interval_secs: 30,
        }
    }
}

impl ValidatorConfig {
    /// Configuration trusting exactly the given dataspaces
    #[must_use]
    pub fn for_dataspaces<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted_dataspaces: domains.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Restrict accepted tokens to the given DSIs
    #[must_use]
    pub fn with_allowed_dsis<I, S>(mut self, dsis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_dsis = dsis.into_iter().map(Into::into).collect();
        self
    }

    /// Set the clock-skew leeway
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs();
        self
    }

    /// Whether `domain` is a trusted dataspace
    #[must_use]
    pub fn is_trusted(&self, domain: &str) -> bool {
        self.trusted_dataspaces.contains(domain)
    }

    /// Leeway as a [`Duration`]
    #[must_use]
    pub fn leeway(&self) -> Duration {
        Duration::from_secs(self.leeway_secs)
    }

    /// Outbound request timeout as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Forced refetch interval as a [`Duration`]
    #[must_use]
    pub fn min_refetch_interval(&self) -> Duration {
        Duration::from_secs(self.min_refetch_interval_secs)
    }
}

/// Lifetimes and capacity of the three resolution caches
///
/// Discovery documents change rarely, key sets rotate on a human timescale,
/// and single-key lookups are only cached to keep the set scan off the hot
/// path, hence the descending TTLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Dataspace configuration → JWKS URL, in seconds
    pub discovery_ttl_secs: u64,
    /// JWKS document, in seconds
    pub key_set_ttl_secs: u64,
    /// Selected key per (domain, kid), in seconds
    pub key_ttl_secs: u64,
    /// Maximum entries per cache; least recently used entries are evicted
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            discovery_ttl_secs: 24 * 60 * 60,
            key_set_ttl_secs: 60 * 60,
            key_ttl_secs: 15 * 60,
            capacity: 16,
        }
    }
}

impl CacheConfig {
    /// Discovery TTL as a [`Duration`]
    #[must_use]
    pub fn discovery_ttl(&self) -> Duration {
        Duration::from_secs(self.discovery_ttl_secs)
    }

    /// Key-set TTL as a [`Duration`]
    #[must_use]
    pub fn key_set_ttl(&self) -> Duration {
        Duration::from_secs(self.key_set_ttl_secs)
    }

    /// Key-selection TTL as a [`Duration`]
    #[must_use]
    pub fn key_ttl(&self) -> Duration {
        Duration::from_secs(self.key_ttl_secs)
    }
}
