//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chunkworld_hub::Hub;
use chunkworld_test_support::{MemoryChunkStore, MockRng};
use http_body_util::BodyExt;
use tower::ServiceExt;

use chunkworld_api::routes;
use chunkworld_api::state::AppState;

/// Build the full app router over an in-memory chunk store and a
/// deterministic RNG. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    build_test_app_with_store(Arc::new(MemoryChunkStore::new()))
}

/// Build the app router over a caller-owned store, for tests that inspect
/// persisted chunks afterwards.
pub fn build_test_app_with_store(store: Arc<MemoryChunkStore>) -> Router {
    let hub = Hub::new(store, Box::new(MockRng));
    routes::router().with_state(AppState::new(Arc::new(hub)))
}

/// Send a GET request and return the raw response.
pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    app.oneshot(request).await.unwrap()
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = get(app, uri).await;
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
