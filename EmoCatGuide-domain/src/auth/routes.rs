use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::auth::logging::{log_auth_event, log_logout, log_token_refresh, mask_secret, AuthEvent, AuthEventType};
use crate::auth::token::{self, TokenType};
use crate::auth::{auth_middleware, bearer_token, AuthResponse, Claims, LoginRequest, RefreshResponse, RegisterRequest, UserInfo};
use crate::entities::User;
use crate::services::errors::ServiceError;
use crate::services::users::UserServiceTrait;

/// Shared user service handle
pub type UserService = Arc<dyn UserServiceTrait + Send + Sync>;

type AuthError = (StatusCode, Json<Value>);

fn auth_error(status: StatusCode, error: &str, message: impl Into<String>) -> AuthError {
    (status, Json(json!({ "error": error, "message": message.into() })))
}

/// Map a service error onto the auth endpoints' error body
fn map_service_error(err: ServiceError) -> AuthError {
    match err {
        ServiceError::Validation(msg) => auth_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Unauthorized(msg) => auth_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        ServiceError::Conflict(_) => auth_error(StatusCode::CONFLICT, "conflict", "Email is already registered"),
        other => {
            error!("Auth request failed: {}", other);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "An unexpected error occurred")
        }
    }
}

/// Issue an access and refresh token pair for a user
fn issue_tokens(user: User, next_step: &str) -> Result<AuthResponse, AuthError> {
    let session_id = token::new_session_id();
    let issue = |token_type| {
        token::generate_token(&user.id, Some(&user.email), token_type, &session_id).map_err(|e| {
            error!("Failed to generate {:?} token: {}", token_type, e);
            auth_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Failed to generate token")
        })
    };

    let access_token = issue(TokenType::Access)?;
    let refresh_token = issue(TokenType::Refresh)?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.expiration().num_seconds(),
        user,
        next_step: next_step.to_string(),
    })
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created. Tokens are returned so the client can continue with the health report upload.", body = AuthResponse),
        (status = 400, description = "Invalid email or password too short"),
        (status = 409, description = "Email is already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register(
    Extension(users): Extension<UserService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let start_time = std::time::Instant::now();
    let email = request.email.trim().to_lowercase();
    debug!("Registration request for {} (password {})", email, mask_secret(&request.password));

    match users.register(request).await {
        Ok(user) => {
            let event = AuthEvent::new(AuthEventType::Registration, Some(&user.id), true)
                .with_details("Account created")
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("password");
            log_auth_event(event);

            let response = issue_tokens(user, "upload_health")?;
            Ok((StatusCode::CREATED, Json(response)))
        },
        Err(e) => {
            let event = AuthEvent::new(AuthEventType::Registration, Some(&email), false)
                .with_details(e.to_string())
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("password");
            log_auth_event(event);

            Err(map_service_error(e))
        }
    }
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful. Use the returned access_token in the Authorization header as 'Bearer {token}'.", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    operation_id = "login"
)]
pub async fn login(
    Extension(users): Extension<UserService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let start_time = std::time::Instant::now();
    let email = request.email.trim().to_lowercase();

    match users.login(request).await {
        Ok(user) => {
            let event = AuthEvent::new(AuthEventType::Login, Some(&user.id), true)
                .with_details("Login successful")
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("password");
            log_auth_event(event);

            Ok(Json(issue_tokens(user, "upload_health")?))
        },
        Err(e) => {
            let event = AuthEvent::new(AuthEventType::FailedLogin, Some(&email), false)
                .with_details(e.to_string())
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("password");
            log_auth_event(event);

            Err(map_service_error(e))
        }
    }
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired refresh token")
    ),
    security(
        ("jwt_auth" = [])
    )
)]
pub async fn refresh_token(headers: HeaderMap) -> Result<Json<RefreshResponse>, AuthError> {
    let start_time = std::time::Instant::now();

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    let refresh_token = match presented {
        Some(token) => token,
        None => {
            let event = AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                .with_details("Missing or malformed Authorization header")
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("refresh_token");
            log_auth_event(event);

            return Err(auth_error(
                StatusCode::UNAUTHORIZED,
                "invalid_request",
                "Send the refresh token as 'Authorization: Bearer <token>'",
            ));
        }
    };

    let claims = match token::validate_token_of_type(refresh_token, TokenType::Refresh) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Invalid refresh token: {}", e);
            let event = AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                .with_details(format!("Invalid or expired refresh token: {}", e))
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("refresh_token");
            log_auth_event(event);

            return Err(auth_error(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid or expired refresh token"));
        }
    };

    // A refresh token minted before session ids existed starts a session of its own
    let session_id = if claims.sid.is_empty() { token::new_session_id() } else { claims.sid.clone() };

    match token::generate_token(&claims.sub, claims.email.as_deref(), TokenType::Access, &session_id) {
        Ok(access_token) => {
            log_token_refresh(&claims.sub, true, None);
            Ok(Json(RefreshResponse {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: TokenType::Access.expiration().num_seconds(),
                user_id: claims.sub,
            }))
        },
        Err(e) => {
            error!("Failed to generate new access token: {}", e);
            log_token_refresh(&claims.sub, false, Some(&format!("Failed to generate new token: {}", e)));
            Err(auth_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Failed to generate new token"))
        }
    }
}

/// End the session of the presented access token.
///
/// The access token and every token issued alongside it, the refresh token
/// included, stop validating.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Not authenticated")
    ),
    security(
        ("jwt_auth" = [])
    )
)]
pub async fn logout(Extension(claims): Extension<Claims>) -> Json<Value> {
    if let Err(e) = token::revoke_token(&claims) {
        error!("Failed to revoke token: {}", e);
    }
    if let Err(e) = token::revoke_session(&claims) {
        error!("Failed to revoke session: {}", e);
    }

    log_logout(&claims.sub);

    Json(json!({
        "message": "Logged out successfully",
        "status": "success"
    }))
}

/// Return the authenticated user
#[utoipa::path(
    get,
    path = "/auth/info",
    tag = "Authentication",
    responses(
        (status = 200, description = "Authentication information", body = UserInfo),
        (status = 401, description = "Not authenticated")
    ),
    security(
        ("jwt_auth" = [])
    )
)]
pub async fn auth_info(Extension(user_info): Extension<UserInfo>) -> Json<Value> {
    Json(json!({
        "user_id": user_info.user_id,
        "email": user_info.email,
        "status": "authenticated"
    }))
}

/// Build the `/auth` router. Logout and info sit behind the access token middleware.
pub fn auth_routes(users: UserService) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/info", get(auth_info))
        .route_layer(middleware::from_fn_with_state((), auth_middleware::<()>));

    public.merge(protected).layer(Extension(users))
}
