//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tenantdb_test_support::{FixedClock, InMemoryEventStore};
use tower::ServiceExt;

use tenantdb_api::routes;
use tenantdb_api::state::AppState;

/// Build the full app router over an in-memory event store stamped with
/// the fixed test instant. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(InMemoryEventStore::new(Arc::new(
        FixedClock::default_instant(),
    ))))
}

/// Build the full app router over `event_store`, so a test can issue
/// several requests against the same streams.
pub fn build_test_app_with(event_store: Arc<InMemoryEventStore>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/tenants", routes::events::router())
        .with_state(AppState::new(event_store))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}
