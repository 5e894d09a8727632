//! Authentication module for the Health Emo Cat Guide API
//!
//! Local email/password accounts with JWT access and refresh tokens

use axum::{
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
    body::Body,
};
use tracing::{debug, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::entities::{Gender, User};

// JWT handling
pub mod token;

// Token blacklist for revocation
pub mod token_blacklist;

// Password hashing
pub mod password;

// Register, login, refresh, logout and info handlers
pub mod routes;

#[cfg(test)]
mod routes_tests;

pub mod logging;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Token ID, used for revocation
    pub jti: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Account email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Login session shared by the access and refresh tokens issued together
    #[serde(default)]
    pub sid: String,
}

/// User information extracted from authenticated requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub user_id: String,
    pub email: Option<String>,
    /// Authentication source (always "jwt")
    pub auth_source: String,
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            auth_source: "jwt".to_string(),
        }
    }
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Optional gender, used for gendered reference ranges
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair issued on registration and login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub access_token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
    /// Where the client should go next
    pub next_step: String,
}

/// New access token issued from a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: String,
}

fn unauthorized() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware for protected routes.
/// Requires a valid, unrevoked access token and inserts `UserInfo` and `Claims`.
pub async fn auth_middleware<S>(
    _state: State<S>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = std::time::Instant::now();

    let reject = |details: String, user_id: Option<String>| {
        let event = AuthEvent::new(AuthEventType::TokenValidation, user_id.as_deref(), false)
            .with_details(details)
            .with_resource(request_path.clone())
            .with_duration(start_time.elapsed().as_millis() as u64)
            .with_auth_method("jwt");
        log_auth_event(event);
        unauthorized()
    };

    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => {
                warn!("Invalid Authorization header format");
                return reject("Invalid Authorization header format".to_string(), None);
            }
        },
        None => {
            debug!("Missing Authorization header");
            return reject("Missing Authorization header".to_string(), None);
        }
    };

    let token = match bearer_token(&header_value) {
        Some(token) => token,
        None => {
            warn!("Authorization header does not contain Bearer token");
            return reject("Authorization header does not contain Bearer token".to_string(), None);
        }
    };

    match token::validate_token_of_type(token, token::TokenType::Access) {
        Ok(claims) => {
            debug!("Token validated for user: {}", claims.sub);

            let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                .with_details("JWT validation successful")
                .with_resource(request_path.clone())
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);

            req.extensions_mut().insert(UserInfo::from(&claims));
            req.extensions_mut().insert(claims);

            next.run(req).await
        },
        Err(e) => {
            warn!("Rejected token: {}", e);
            reject(e.to_string(), None)
        }
    }
}

/// Configure CORS and security headers for the application
pub fn configure_auth(app: axum::Router) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    let auth_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            header::HeaderValue::from_static("strict-origin-when-cross-origin")
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::HeaderName::from_static("permissions-policy"),
            header::HeaderValue::from_static("camera=(self), microphone=(), geolocation=()")
        ));

    app.layer(auth_cors).layer(security_headers)
}
