// Handler tests driven through the router with in-memory services


use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use emo_cat_guide_domain::config::AppConfig;
use emo_cat_guide_domain::testing::{create_test_services, MockHealthService, StubReportAnalyzer};

use crate::api::routes::create_router;

const BOUNDARY: &str = "emo-cat-guide-boundary";

pub(super) fn test_app(analyzer: Option<StubReportAnalyzer>) -> Router {
    std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_only");
    create_router(
        &AppConfig::default(),
        create_test_services(analyzer),
        Arc::new(MockHealthService::new()),
    )
}

/// Send a request and decode the body as JSON (`Null` when it is not JSON)
pub(super) async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Register an account and return its access token
pub(super) async fn register(app: &Router, email: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": email, "password": "meow123"}).to_string()))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    body["access_token"].as_str().unwrap().to_string()
}

pub(super) fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
}

pub(super) fn upload_request(token: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    authed("POST", "/api/v1/health-reports", token)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub(super) fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    authed(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
