//! # API Token Verification
//!
//! Dataspace API tokens are RS256 JWTs. The issuer names the dataspace, the
//! header `kid` names the signing key within the dataspace's JWKS, and the
//! audience is the DSI of the data product the token was issued for.
//!
//! ## Architecture
//!
//! ```text
//! token ─► claims (unverified kid, iss)
//!            │
//!            ▼
//!   DataspaceResolver ─► JwksFetcher ─► KeySelector      (cached, single-flight)
//!            │
//!            ▼
//!   TokenValidator: RS256 signature, expiry + leeway, aud == DSI
//! ```

mod claims;
pub mod jwks;
mod selector;
mod validator;

use std::ops::Deref;

use serde::{Deserialize, Serialize};

pub use claims::{extract_issuer, extract_kid};
pub use jwks::{FetchedKeySet, Jwk, JwkSet, JwksFetcher};
pub use selector::{KeySelector, RefetchPolicy, SelectedKey};
pub use validator::TokenValidator;

/// Claims of a dataspace API token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTokenClaims {
    /// Issuer (`https://{dataspace domain}`)
    pub iss: String,
    /// Subject: the application the token was issued to
    pub sub: String,
    /// Audience: the DSI the token was issued for
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Claims of a token that passed every check
///
/// Only [`TokenValidator::validate`] creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    claims: ApiTokenClaims,
    kid: String,
    jwks_url: String,
}

impl VerifiedClaims {
    pub(crate) fn new(claims: ApiTokenClaims, kid: String, jwks_url: String) -> Self {
        Self {
            claims,
            kid,
            jwks_url,
        }
    }

    /// ID of the key that verified the signature
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// JWKS URL the verifying key came from
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Unwrap the claims
    pub fn into_claims(self) -> ApiTokenClaims {
        self.claims
    }
}

impl Deref for VerifiedClaims {
    type Target = ApiTokenClaims;

    fn deref(&self) -> &Self::Target {
        &self.claims
    }
}
