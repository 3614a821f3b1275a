//! Error taxonomy for API token verification
//!
//! Every variant is terminal for the validation call that produced it. None of
//! them are retried internally; transient network failures surface as
//! [`AuthError::Discovery`] or [`AuthError::KeySetFetch`] and the caller may
//! retry the whole request.
//!
//! The `Display` output carries internal details (issuer, key ID, JWKS URL)
//! and is meant for server-side logs only. HTTP layers should answer with
//! [`AuthError::status_code`] and a generic body.

use thiserror::Error;

/// Result type for token verification
pub type AuthResult<T> = Result<T, AuthError>;

/// API token verification errors
///
/// `Clone` so that one cache-fill outcome can be handed to every caller that
/// waited on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The token is structurally invalid or lacks a required field
    #[error("Malformed API token: {0}")]
    MalformedToken(String),

    /// The issuer domain is not one of the trusted dataspaces
    #[error("Unknown dataspace {issuer}, only supporting {}", trusted.join(", "))]
    UntrustedIssuer {
        /// Issuer as found in the unverified payload
        issuer: String,
        /// Configured trusted dataspace domains
        trusted: Vec<String>,
    },

    /// The dataspace configuration document could not be fetched or parsed
    #[error("Dataspace discovery failed for {domain}: {reason}")]
    Discovery {
        /// Dataspace base domain
        domain: String,
        /// Underlying cause
        reason: String,
    },

    /// The JWKS document could not be fetched or parsed
    #[error("JWKS fetch from {jwks_url} failed: {reason}")]
    KeySetFetch {
        /// JWKS URL announced by the dataspace configuration
        jwks_url: String,
        /// Underlying cause
        reason: String,
    },

    /// No unique key matches the requested key ID and required constraints
    #[error(
        "{jwks_url} contains {matches} JWKs with the ID {kid}, with kty RSA, use sig, and alg RS256 (expected exactly one). Cannot verify API token."
    )]
    KeyNotFound {
        /// JWKS URL the key set was fetched from
        jwks_url: String,
        /// Requested key ID
        kid: String,
        /// Number of keys that matched (0 or more than 1)
        matches: usize,
    },

    /// The expected DSI is not on the configured allow-list
    #[error("DSI {dsi} is not published by this data product")]
    DisallowedResource {
        /// Expected DSI for the request
        dsi: String,
    },

    /// The signature does not verify against the resolved key
    #[error("API token signature verification failed: {0}")]
    Signature(String),

    /// The token expired beyond the allowed clock-skew leeway
    #[error("API token expired at {exp} (now {now}, leeway {leeway}s)")]
    TokenExpired {
        /// Expiry timestamp from the token
        exp: u64,
        /// Validation time
        now: u64,
        /// Allowed leeway in seconds
        leeway: u64,
    },

    /// The audience claim does not match the DSI of the request
    #[error("Expected DSI {expected}, got {actual}")]
    AudienceMismatch {
        /// DSI derived from the request
        expected: String,
        /// Audience claimed by the token
        actual: String,
    },
}

/// Coarse classification of [`AuthError`], for metrics and status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// See [`AuthError::MalformedToken`]
    MalformedToken,
    /// See [`AuthError::UntrustedIssuer`]
    UntrustedIssuer,
    /// See [`AuthError::Discovery`]
    Discovery,
    /// See [`AuthError::KeySetFetch`]
    KeySetFetch,
    /// See [`AuthError::KeyNotFound`]
    KeyNotFound,
    /// See [`AuthError::DisallowedResource`]
    DisallowedResource,
    /// See [`AuthError::Signature`]
    Signature,
    /// See [`AuthError::TokenExpired`]
    TokenExpired,
    /// See [`AuthError::AudienceMismatch`]
    AudienceMismatch,
}

impl AuthErrorKind {
    /// Stable snake_case name, used as a log field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::UntrustedIssuer => "untrusted_issuer",
            Self::Discovery => "discovery",
            Self::KeySetFetch => "key_set_fetch",
            Self::KeyNotFound => "key_not_found",
            Self::DisallowedResource => "disallowed_resource",
            Self::Signature => "signature",
            Self::TokenExpired => "token_expired",
            Self::AudienceMismatch => "audience_mismatch",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::MalformedToken(_) => AuthErrorKind::MalformedToken,
            Self::UntrustedIssuer { .. } => AuthErrorKind::UntrustedIssuer,
            Self::Discovery { .. } => AuthErrorKind::Discovery,
            Self::KeySetFetch { .. } => AuthErrorKind::KeySetFetch,
            Self::KeyNotFound { .. } => AuthErrorKind::KeyNotFound,
            Self::DisallowedResource { .. } => AuthErrorKind::DisallowedResource,
            Self::Signature(_) => AuthErrorKind::Signature,
            Self::TokenExpired { .. } => AuthErrorKind::TokenExpired,
            Self::AudienceMismatch { .. } => AuthErrorKind::AudienceMismatch,
        }
    }

    /// HTTP status an HTTP layer should answer with
    ///
    /// The credential was understood but does not grant access to this
    /// resource: 403. Anything else: 401.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self.kind() {
            AuthErrorKind::UntrustedIssuer
            | AuthErrorKind::DisallowedResource
            | AuthErrorKind::AudienceMismatch => http::StatusCode::FORBIDDEN,
            _ => http::StatusCode::UNAUTHORIZED,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken(reason.into())
    }

    pub(crate) fn discovery(domain: &str, reason: impl std::fmt::Display) -> Self {
        Self::Discovery {
            domain: domain.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn key_set_fetch(jwks_url: &str, reason: impl std::fmt::Display) -> Self {
        Self::KeySetFetch {
            jwks_url: jwks_url.to_string(),
            reason: reason.to_string(),
        }
    }
}
