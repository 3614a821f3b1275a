//! Common test utilities for integration tests
//!
//! Provides an in-memory dataspace (discovery document + JWKS) behind the
//! `HttpFetch` seam, fixed RSA keys and a token signer.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use productizer_auth::{
    FetchError, FixedClock, HttpFetch, HttpResponse, TokenValidator, ValidatorConfig,
};
use serde_json::{Value, json};

pub const DOMAIN: &str = "testbed.fi";
pub const ISSUER: &str = "https://testbed.fi";
pub const CONFIG_URL: &str = "https://testbed.fi/.well-known/dataspace/dataspace-configuration.json";
pub const JWKS_URL: &str = "https://testbed.fi/.well-known/jwks.json";
pub const RESOURCE: &str = "/Weather/Current/Metric";
pub const DSI: &str = "dpp://testbed.fi/Weather/Current/Metric";

/// Validation time used with [`FixedClock`]
pub const NOW: u64 = 1_700_000_000;

pub const SIGNING_KEY: &[u8] = include_bytes!("../fixtures/signing_key.pem");
pub const ROTATED_KEY: &[u8] = include_bytes!("../fixtures/rotated_key.pem");
pub const ROGUE_KEY: &[u8] = include_bytes!("../fixtures/rogue_key.pem");

/// Base64url RSA moduli of the fixture keys (exponent is AQAB for all)
pub const SIGNING_N: &str = "ipE1ABkBfZ7b_2564eM9UlqD05CJTHR4zB_Il437b3lCGLFU32va91DOqBcqiS0O6WISOMolpa0vlPFI95tFnZ9Wu13JPbO-eqHWJPXzdl5dk_7tNZbuzgtzyPiUTJ9BqQgJWsTusbwHI6Q5ZkoHbKoQtZMsQJVNfvuXxnPaz7DM2uXeBii5onbWZK46aBJ2ONRfsDjdtpasOCXhM3JnNT-O3JWPHXvArsgVa7iy5R8fg3-Vgvk90g6SoKi9NX_rts0uf9o9oQz_wysPxiIDaynmgHtxXqSTS1m8JC9VrIKX_XV7HyCARDZuQmSLo6ZF8-6lYDGSpZQKdvGwoifMIQ";
pub const ROTATED_N: &str = "2RMQvt-LhDC3mW1PZiZYLe55R5jEBD5ADO3u0NKuNJmgbqhZqAnDbUGIv4TJZkZxrqWQFOvZtEAkD4DD0jkkSYtbBqaSK1aSMiYFW5yTeQ-vjbD6Ck1yM-voQjSbEwhXw2pheO0FWyumzhmB_a1C-zSospE6CLpetVY1yy_WLyBxa434_ihOab6SlhUw2QojhrFt0yETLafQGiaGEkOhTKVs16CTR5jyCg8iyPEwdC84-FHb6Sx9g_fZSc02v1bbIeC9O0wq68VcmK0q2SrgEnpbu96U23AdWzEe8tqPUgPzv0n0P1dKlEuuuPiPfmbzrtn0v1xLUngWw09Y7rHo1w";
pub const ROGUE_N: &str = "wgznWCISxLkA_mKSTRm30ySi0dtA4-w09w5vXL8PO7cfKzfpZWHSTfA98TLBn5l72P3OkKIymfsfT3el1E9pMGDgXelZZIzyCOePL2bAcrT8Yh-deqVZ1Ggd8Niej-IYYSYDzZ3-v651KtFJSmnGF-4czPaVkKoFuZJkPuzHQ58pViF-QzO_6Him6h1YSQqlQTUc8A0upuXhSWet3pW9CCW4YcFIQd2N_D8ioNmw8QJKu-n0R6d1WRkdqHckRKDd27jo6X4y-GnfcnWMeFOZn_vogsdDJQGV1FOceIiqEPK62hzDjCv1WiQmsHyPzIe8_G65jAWzBSZU1Kyrn1XliQ";

/// In-memory dataspace reachable through [`HttpFetch`]
///
/// Counts every GET per URL (before the optional delay, so concurrent
/// callers are all counted) and serves whatever was last configured.
#[derive(Debug, Default)]
pub struct FakeDataspace {
    routes: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Duration>,
}

impl FakeDataspace {
    /// A dataspace at [`DOMAIN`] publishing `keys`
    pub fn with_keys(keys: Value) -> Arc<Self> {
        let fake = Arc::new(Self::default());
        fake.set_json(
            CONFIG_URL,
            200,
            json!({
                "dataspace_base_domain": DOMAIN,
                "dataspace_name": "Testbed",
                "jwks_uri": JWKS_URL,
            }),
        );
        fake.set_keys(keys);
        fake
    }

    /// A dataspace publishing only the signing key as `k1`
    pub fn standard() -> Arc<Self> {
        Self::with_keys(json!([rsa_jwk("k1", SIGNING_N)]))
    }

    pub fn set_keys(&self, keys: Value) {
        self.set_json(JWKS_URL, 200, json!({ "keys": keys }));
    }

    pub fn set_json(&self, url: &str, status: u16, body: Value) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status,
                body: serde_json::to_vec(&body).unwrap(),
            },
        );
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HttpFetch for FakeDataspace {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("connection refused: {url}")))
    }
}

/// An RS256 signature JWK
pub fn rsa_jwk(kid: &str, n: &str) -> Value {
    json!({ "kty": "RSA", "use": "sig", "alg": "RS256", "kid": kid, "n": n, "e": "AQAB" })
}

/// Claims of a valid token for [`DSI`]
pub fn claims() -> Value {
    json!({
        "iss": ISSUER,
        "sub": "test-application",
        "aud": DSI,
        "iat": NOW - 60,
        "exp": NOW + 3600,
    })
}

/// Sign `claims` with RS256 and the given PEM key
pub fn sign(kid: Option<&str>, pem: &[u8], claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &EncodingKey::from_rsa_pem(pem).unwrap()).unwrap()
}

/// A valid token for [`DSI`] signed with the standard key
pub fn valid_token() -> String {
    sign(Some("k1"), SIGNING_KEY, &claims())
}

/// Validator trusting [`DOMAIN`], with the clock frozen at [`NOW`]
pub fn validator(http: Arc<FakeDataspace>) -> TokenValidator {
    validator_with(ValidatorConfig::for_dataspaces([DOMAIN]), http)
}

pub fn validator_with(config: ValidatorConfig, http: Arc<FakeDataspace>) -> TokenValidator {
    TokenValidator::with_http(config, http).with_clock(Arc::new(FixedClock(NOW)))
}
