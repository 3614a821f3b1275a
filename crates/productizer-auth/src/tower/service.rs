//! Tower Service implementation for API token verification
//!
//! For every request the service:
//! - Reads the token from the API key header (configurable)
//! - Reads the `source` query parameter (empty if absent)
//! - Uses the decoded request path as the resource path
//! - Validates the token with the shared [`TokenValidator`]
//!
//! Rejected requests get the error's status code and a generic JSON body;
//! the cause is only logged.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::{Request, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use tower_service::Service;
use tracing::debug;

use super::ApiTokenLayerConfig;
use crate::jwt::TokenValidator;

/// Tower Service that verifies API tokens
///
/// On success the [`VerifiedClaims`](crate::VerifiedClaims) are inserted into
/// the request's extensions before the request is forwarded.
#[derive(Debug, Clone)]
pub struct ApiTokenService<S> {
    inner: S,
    validator: TokenValidator,
    config: ApiTokenLayerConfig,
}

/// Future type for [`ApiTokenService`] responses
pub type ApiTokenServiceFuture<T, E> = BoxFuture<'static, Result<T, E>>;

enum Token {
    Missing,
    Invalid,
    Present(String),
}

impl<S> ApiTokenService<S> {
    /// Create a new API token service
    pub fn new(inner: S, validator: TokenValidator, config: ApiTokenLayerConfig) -> Self {
        Self {
            inner,
            validator,
            config,
        }
    }

    /// Get a reference to the inner service
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn extract_token(&self, headers: &HeaderMap) -> Token {
        match headers.get(&self.config.api_key_header).map(HeaderValue::to_str) {
            None => Token::Missing,
            Some(Ok("")) => Token::Missing,
            Some(Ok(value)) => Token::Present(value.to_string()),
            Some(Err(_)) => Token::Invalid,
        }
    }

    fn extract_source(&self, uri: &Uri) -> String {
        uri.query()
            .and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(name, _)| *name == self.config.source_param)
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_default()
    }
}

fn rejection<ResBody: From<String>>(status: StatusCode) -> Response<ResBody> {
    let detail = status.canonical_reason().unwrap_or("Unauthorized");
    let body = serde_json::json!({ "detail": detail }).to_string();

    let mut response = Response::new(ResBody::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl<S, B, ResBody> Service<Request<B>> for ApiTokenService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
    B: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = ApiTokenServiceFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        let token = match self.extract_token(req.headers()) {
            Token::Present(token) => token,
            Token::Missing if self.config.allow_anonymous => {
                return Box::pin(async move { inner.call(req).await });
            }
            Token::Missing => {
                debug!(path = %req.uri().path(), "No API token provided");
                return Box::pin(async move { Ok(rejection(StatusCode::UNAUTHORIZED)) });
            }
            Token::Invalid => {
                debug!(path = %req.uri().path(), "API token header is not valid text");
                return Box::pin(async move { Ok(rejection(StatusCode::UNAUTHORIZED)) });
            }
        };

        let validator = self.validator.clone();
        let source = self.extract_source(req.uri());
        let resource_path = percent_decode_str(req.uri().path())
            .decode_utf8_lossy()
            .into_owned();

        Box::pin(async move {
            match validator.validate(&token, &resource_path, &source).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(e) => Ok(rejection(e.status_code())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VerifiedClaims;
    use crate::config::ValidatorConfig;
    use crate::test_support::StaticHttp;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use std::convert::Infallible;
    use std::sync::Arc;
    use tower::{ServiceExt, service_fn};

    async fn echo(req: Request<String>) -> Result<Response<String>, Infallible> {
        let verified = req.extensions().get::<VerifiedClaims>().is_some();
        Ok(Response::new(format!("verified={verified}")))
    }

    fn service(
        config: ApiTokenLayerConfig,
    ) -> ApiTokenService<
        impl Service<Request<String>, Response = Response<String>, Error = Infallible, Future: Send>
        + Clone
        + Send
        + 'static,
    > {
        let validator = TokenValidator::with_http(
            ValidatorConfig::for_dataspaces(["example.com"]),
            Arc::new(StaticHttp::new()),
        );
        ApiTokenService::new(service_fn(echo), validator, config)
    }

    fn request(uri: &str, token: Option<&str>) -> Request<String> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(token) = token {
            builder = builder.header("X-API-Key", token);
        }
        builder.body(String::new()).unwrap()
    }

    fn token_from(issuer: &str) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"k"}"#),
            URL_SAFE_NO_PAD.encode(format!(r#"{{"iss":"{issuer}"}}"#))
        )
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_by_default() {
        let response = service(ApiTokenLayerConfig::default())
            .oneshot(request("/Weather/Current/Metric", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body(), r#"{"detail":"Unauthorized"}"#);
    }

    #[tokio::test]
    async fn test_missing_token_passes_when_anonymous_allowed() {
        let response = service(ApiTokenLayerConfig::allow_anonymous())
            .oneshot(request("/Weather/Current/Metric", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "verified=false");
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected_even_when_anonymous_allowed() {
        let response = service(ApiTokenLayerConfig::allow_anonymous())
            .oneshot(request("/Weather/Current/Metric", Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_untrusted_issuer_is_forbidden_with_generic_body() {
        let token = token_from("https://evil.example");
        let response = service(ApiTokenLayerConfig::default())
            .oneshot(request("/Weather/Current/Metric", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), r#"{"detail":"Forbidden"}"#);
        assert!(!response.body().contains("evil.example"));
    }

    #[test]
    fn test_source_extraction() {
        let service = service(ApiTokenLayerConfig::default());
        let uri: Uri = "/A?x=1&source=group%3Avariant&source=ignored".parse().unwrap();
        assert_eq!(service.extract_source(&uri), "group:variant");

        let uri: Uri = "/A?x=1".parse().unwrap();
        assert_eq!(service.extract_source(&uri), "");

        let uri: Uri = "/A".parse().unwrap();
        assert_eq!(service.extract_source(&uri), "");
    }
}
