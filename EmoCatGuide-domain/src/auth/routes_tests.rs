use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use emo_cat_guide_data::repository::UserRepository;

use crate::auth::routes::auth_routes;
use crate::auth::token::tests::setup_test_env;
use crate::services::users::UserService;

const BODY_SIZE_LIMIT: usize = 1024 * 1024;

fn app() -> Router {
    setup_test_env();
    auth_routes(Arc::new(UserService::new(UserRepository::new())))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_SIZE_LIMIT).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn register(app: &Router, email: &str) -> Value {
    let (status, body) = send(app, "POST", "/register", None, Some(json!({
        "email": email,
        "password": "meow123",
        "gender": "male"
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body
}

#[tokio::test]
async fn test_register_returns_tokens_and_next_step() {
    let app = app();
    let body = register(&app, "Tora@Example.com").await;

    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["next_step"], "upload_health");
    assert_eq!(body["user"]["email"], "tora@example.com");
    assert_eq!(body["user"]["gender"], "male");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_short_passwords() {
    let app = app();
    register(&app, "tama@example.com").await;

    let (status, body) = send(&app, "POST", "/register", None, Some(json!({
        "email": "TAMA@example.com",
        "password": "another1"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = send(&app, "POST", "/register", None, Some(json!({
        "email": "kitten@example.com",
        "password": "12345"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login() {
    let app = app();
    register(&app, "momo@example.com").await;

    let (status, body) = send(&app, "POST", "/login", None, Some(json!({
        "email": "momo@example.com",
        "password": "meow123"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["user"]["last_login"].is_string());

    let (status, body) = send(&app, "POST", "/login", None, Some(json!({
        "email": "momo@example.com",
        "password": "wrong-password"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_refresh_requires_a_refresh_token() {
    let app = app();
    let tokens = register(&app, "sakura@example.com").await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, _) = send(&app, "POST", "/refresh", Some(access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/refresh", Some(refresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["user_id"], tokens["user"]["id"]);

    let (status, _) = send(&app, "POST", "/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_the_access_token() {
    let app = app();
    let tokens = register(&app, "kuro@example.com").await;
    let access = tokens["access_token"].as_str().unwrap();

    let (status, body) = send(&app, "GET", "/info", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "kuro@example.com");

    let (status, _) = send(&app, "POST", "/logout", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/info", Some(access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_the_whole_session() {
    let app = app();
    let tokens = register(&app, "mikan@example.com").await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, body) = send(&app, "POST", "/refresh", Some(refresh), None).await;
    assert_eq!(status, StatusCode::OK);
    let refreshed_access = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", "/logout", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/refresh", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = send(&app, "GET", "/info", Some(&refreshed_access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging in again opens a fresh session
    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "mikan@example.com", "password": "meow123" })),
    ).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/refresh", body["refresh_token"].as_str(), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_info_requires_authentication() {
    let app = app();
    let (status, _) = send(&app, "GET", "/info", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
