//! Shared helpers for driving the HTTP API in-process.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use salesdesk::adapters::sqlite::create_migrated_test_pool;
use salesdesk::{build_router, AppState, Config};

/// Router over a fresh migrated in-memory database.
pub async fn test_app(config: Config) -> Router {
    let pool = create_migrated_test_pool().await.expect("test pool");
    let state = Arc::new(AppState::from_pool(pool, &config));
    build_router(state, false)
}

pub async fn default_app() -> Router {
    test_app(Config::default()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, bytes.to_vec())
}

/// Send a request with an optional JSON body and bearer token, decoding the JSON answer.
pub async fn request_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let (status, bytes) = send(app, request).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    request_json(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request_json(app, Method::POST, uri, Some(body), None).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request_json(app, Method::PUT, uri, Some(body), None).await
}

pub async fn delete_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    request_json(app, Method::DELETE, uri, None, None).await
}

/// GET a plain text endpoint.
pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
    let (status, bytes) = send(app, request).await;
    (status, String::from_utf8(bytes).expect("utf8 body"))
}
