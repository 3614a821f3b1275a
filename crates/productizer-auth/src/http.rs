//! Outbound HTTP GET capability
//!
//! The resolution stages only need "GET this URL, give me status and body".
//! [`HttpFetch`] is that seam; [`ReqwestFetcher`] is the production
//! implementation and tests substitute an in-memory fake.
//!
//! ## Security Configuration
//!
//! [`ReqwestFetcher`] is configured to:
//! - NOT follow redirects (the discovery chain must stay on the issuer origin)
//! - Time out every request (a hung dataspace must not hang request tasks)
//! - Cap response bodies

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// HTTP fetch errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// The body exceeded the configured size limit
    #[error("response exceeds {0} bytes")]
    TooLarge(usize),

    /// The body is not the expected JSON document
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
}

/// Status and body of a completed GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to GET a URL
#[async_trait]
pub trait HttpFetch: Send + Sync + Debug {
    /// Perform a GET request
    ///
    /// Implementations return non-2xx responses as `Ok`; status handling is
    /// left to [`get_json`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if no response could be obtained.
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// GET `url` and deserialize a JSON body
///
/// # Errors
///
/// Returns [`FetchError::Status`] for non-2xx responses and
/// [`FetchError::InvalidJson`] if the body does not deserialize into `T`.
pub async fn get_json<T>(http: &dyn HttpFetch, url: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let response = http.get(url).await?;

    // If the response is not with a successful status code fail
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    serde_json::from_slice(&response.body).map_err(|e| FetchError::InvalidJson(e.to_string()))
}

/// [`HttpFetch`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_response_bytes: usize,
}

impl ReqwestFetcher {
    /// Create a fetcher with the given request timeout and body limit
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(timeout: Duration, max_response_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("productizer-auth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::from_client(client, timeout, max_response_bytes))
    }

    /// Wrap an existing client
    ///
    /// The client should be configured with `redirect::Policy::none()` and a
    /// timeout; `timeout` is only used to label timeout errors.
    pub fn from_client(client: reqwest::Client, timeout: Duration, max_response_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_response_bytes,
        }
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();

        if let Some(content_length) = response.content_length()
            && content_length > self.max_response_bytes as u64
        {
            return Err(FetchError::TooLarge(self.max_response_bytes));
        }

        // Read chunk-wise so a lying or missing Content-Length cannot exhaust memory
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            if body.len() + chunk.len() > self.max_response_bytes {
                return Err(FetchError::TooLarge(self.max_response_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = url, status = status, bytes = body.len(), "HTTP GET completed");

        Ok(HttpResponse { status, body })
    }
}
