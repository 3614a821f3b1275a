//! Unverified claim extraction
//!
//! The key ID and issuer are needed before the signature can be checked: they
//! tell us which dataspace and which key to fetch. Nothing read here is
//! authenticated, and none of it leaves the key-resolution path.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::decode_header;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Hints read from a token before verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnverifiedToken {
    /// `kid` from the header
    pub(crate) kid: String,
    /// `iss` from the payload
    pub(crate) issuer: String,
}

impl UnverifiedToken {
    pub(crate) fn parse(token: &str) -> AuthResult<Self> {
        Ok(Self {
            kid: extract_kid(token)?,
            issuer: extract_issuer(token)?,
        })
    }
}

#[derive(Deserialize)]
struct UnverifiedPayload {
    iss: Option<String>,
}

/// Read the signing key ID from the token header
///
/// The value is unauthenticated.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the header cannot be decoded or
/// has no `kid`.
pub fn extract_kid(token: &str) -> AuthResult<String> {
    let header = decode_header(token)
        .map_err(|e| AuthError::malformed(format!("Invalid JWT header: {e}")))?;

    header
        .kid
        .ok_or_else(|| AuthError::malformed("Missing 'kid' in API token JWT header"))
}

/// Read the issuer from the token payload without checking the signature
///
/// The value is unauthenticated.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the payload cannot be decoded or
/// has no `iss`.
pub fn extract_issuer(token: &str) -> AuthResult<String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::malformed("Invalid JWT format"));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::malformed(format!("Invalid JWT payload encoding: {e}")))?;

    let payload: UnverifiedPayload = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::malformed(format!("Invalid JWT claims: {e}")))?;

    payload
        .iss
        .ok_or_else(|| AuthError::malformed("Missing 'iss' in API token JWT payload"))
}
