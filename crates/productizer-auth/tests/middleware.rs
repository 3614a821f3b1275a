//! Tower middleware with signed tokens

#![cfg(feature = "middleware")]

mod common;

use std::convert::Infallible;

use common::*;
use http::{Request, Response, StatusCode};
use productizer_auth::VerifiedClaims;
use productizer_auth::tower::{ApiTokenLayer, ApiTokenLayerConfig};
use serde_json::json;
use tower::{Layer, ServiceExt, service_fn};

async fn whoami(req: Request<String>) -> Result<Response<String>, Infallible> {
    let body = match req.extensions().get::<VerifiedClaims>() {
        Some(claims) => format!("{} via {}", claims.sub, claims.aud),
        None => "anonymous".to_string(),
    };
    Ok(Response::new(body))
}

fn request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-API-Key", token);
    }
    builder.body(String::new()).unwrap()
}

#[tokio::test]
async fn test_verified_claims_reach_inner_service() {
    let layer = ApiTokenLayer::new(validator(FakeDataspace::standard()));

    let response = layer
        .layer(service_fn(whoami))
        .oneshot(request(RESOURCE, Some(&valid_token())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &format!("test-application via {DSI}"));
}

#[tokio::test]
async fn test_source_query_parameter_selects_audience() {
    let layer = ApiTokenLayer::new(validator(FakeDataspace::standard()));
    let mut claims = claims();
    claims["aud"] = json!("dpp://ihmiset@testbed.fi/Weather/Current/Metric");
    let token = sign(Some("k1"), SIGNING_KEY, &claims);

    let response = layer
        .layer(service_fn(whoami))
        .oneshot(request(
            "/Weather/Current/Metric?source=ihmiset",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = layer
        .layer(service_fn(whoami))
        .oneshot(request("/Weather/Current/Metric", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.body(), r#"{"detail":"Forbidden"}"#);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let layer = ApiTokenLayer::new(validator(FakeDataspace::standard()));
    let mut claims = claims();
    claims["exp"] = json!(NOW - 3600);
    let token = sign(Some("k1"), SIGNING_KEY, &claims);

    let response = layer
        .layer(service_fn(whoami))
        .oneshot(request(RESOURCE, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.body(), r#"{"detail":"Unauthorized"}"#);
}

#[tokio::test]
async fn test_anonymous_pass_through() {
    let layer = ApiTokenLayer::with_config(
        validator(FakeDataspace::standard()),
        ApiTokenLayerConfig::allow_anonymous(),
    );

    let response = layer
        .layer(service_fn(whoami))
        .oneshot(request(RESOURCE, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "anonymous");
}

#[tokio::test]
async fn test_layer_shares_caches_between_services() {
    let http = FakeDataspace::standard();
    let layer = ApiTokenLayer::new(validator(http.clone()));
    let token = valid_token();

    for _ in 0..3 {
        let response = layer
            .layer(service_fn(whoami))
            .oneshot(request(RESOURCE, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(http.calls(CONFIG_URL), 1);
    assert_eq!(http.calls(JWKS_URL), 1);
}
