//! End-to-end tests for the auth gate.
//!
//! Runs a real axum router through the middleware against a wiremock stub of
//! the auth service.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use auth_gate::{auth_middleware, AuthConfig, AuthGate, RemoteVerifier};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Router with one protected route and a counter of handler invocations.
fn protected_app(url: &str) -> (Router, Arc<AtomicUsize>) {
    protected_app_with(AuthConfig {
        url: url.to_string(),
        ..AuthConfig::default()
    })
}

fn protected_app_with(config: AuthConfig) -> (Router, Arc<AtomicUsize>) {
    let verifier = RemoteVerifier::new(&config).unwrap();
    let gate = AuthGate::new(Arc::new(verifier), &config.token_scheme);

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new()
        .route(
            "/protected",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::ACCEPTED, "inner handler")
                }
            }),
        )
        .layer(middleware::from_fn_with_state(gate, auth_middleware));

    (app, hits)
}

fn request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/protected");
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn accepted_token_invokes_handler_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "JWT abc123"))
        .and(body_json(json!({ "token": "abc123" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "0", "message": "ok", "data": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&format!("{}/verify", server.uri()));
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    // The handler's own status comes through; the gate writes none.
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_text(response).await, "inner handler");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_header_is_rejected_without_outbound_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "0" })))
        .expect(0)
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_scheme_is_rejected_without_outbound_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "0" })))
        .expect(0)
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(Some("Bearer abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_zero_code_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "token": "bad" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "1",
            "message": "invalid token",
            "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(Some("JWT bad"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn verdict_ignores_message_data_and_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "0",
            "message": "anything",
            "data": [1, "two", { "three": 3 }]
        })))
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn numeric_code_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0 })))
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway error</html>"))
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_service_is_rejected() {
    // Nothing listens on port 1.
    let (app, hits) = protected_app("http://127.0.0.1:1/verify");
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "0" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let (app, hits) = protected_app_with(AuthConfig {
        url: server.uri(),
        timeout: Some(Duration::from_millis(200)),
        ..AuthConfig::default()
    });
    let response = tokio::time::timeout(
        Duration::from_secs(1),
        app.oneshot(request(Some("JWT abc123"))),
    )
    .await
    .expect("gate should give up before the auth service answers")
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accept_invalid_certs_still_verifies_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "0" })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, hits) = protected_app_with(AuthConfig {
        url: server.uri(),
        accept_invalid_certs: true,
        ..AuthConfig::default()
    });
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_endpoint_fails_closed() {
    let (app, hits) = protected_app("");
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_request_gets_same_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "0" })))
        .expect(2)
        .mount(&server)
        .await;

    let (app, hits) = protected_app(&server.uri());
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Some("JWT abc123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn endpoint_reload_takes_effect_on_next_request() {
    let rejecting = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "1" })))
        .mount(&rejecting)
        .await;
    let accepting = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "0" })))
        .mount(&accepting)
        .await;

    let verifier = RemoteVerifier::new(&AuthConfig {
        url: rejecting.uri(),
        ..AuthConfig::default()
    })
    .unwrap();
    let gate = AuthGate::new(Arc::new(verifier.clone()), "JWT ");
    let app = Router::new()
        .route("/protected", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(gate, auth_middleware));

    let response = app
        .clone()
        .oneshot(request(Some("JWT abc123")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    verifier.set_endpoint(accepting.uri());
    let response = app.oneshot(request(Some("JWT abc123"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
