use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

/// Types of authentication events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthEventType {
    /// User login attempt
    Login,
    /// User logout
    Logout,
    /// Account creation
    Registration,
    /// Token refresh
    TokenRefresh,
    /// Token revocation
    TokenRevocation,
    /// Failed login attempt
    FailedLogin,
    /// Token validation in the middleware
    TokenValidation,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::TokenRefresh => write!(f, "TOKEN_REFRESH"),
            AuthEventType::TokenRevocation => write!(f, "TOKEN_REVOCATION"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// User ID or email (if available)
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Additional details about the event
    pub details: Option<String>,
    /// Request path (if applicable)
    pub resource: Option<String>,
    /// Duration of the operation in milliseconds
    pub duration_ms: Option<u64>,
    /// Authentication method used (password, jwt, refresh_token)
    pub auth_method: Option<String>,
}

impl AuthEvent {
    /// Create a new authentication event
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Log an authentication event. Failures are logged at warn level.
pub fn log_auth_event(event: AuthEvent) {
    let user_id_str = event.user_id.as_deref().unwrap_or("anonymous");
    let details = event.details.as_deref().unwrap_or("");
    let resource = event.resource.as_deref().unwrap_or("-");
    let method = event.auth_method.as_deref().unwrap_or("-");
    let duration = event.duration_ms.unwrap_or(0);

    if event.success {
        info!(
            "AUTH-LOG [{}] [{}] [SUCCESS] [{}] [{}] [{}] [{}ms] {}",
            event.event_type, user_id_str, event.timestamp.to_rfc3339(), method, resource, duration, details
        );
    } else {
        warn!(
            "AUTH-LOG [{}] [{}] [FAILURE] [{}] [{}] [{}] [{}ms] {}",
            event.event_type, user_id_str, event.timestamp.to_rfc3339(), method, resource, duration, details
        );
    }
}

/// Mask a secret for logging, keeping only its length
pub fn mask_secret(secret: &str) -> String {
    format!("***({} chars)", secret.chars().count())
}

/// Log a token refresh
pub fn log_token_refresh(user_id: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRefresh, Some(user_id), success)
        .with_auth_method("refresh_token");

    if let Some(d) = details {
        event = event.with_details(d);
    }

    log_auth_event(event);
}

/// Log a logout event
pub fn log_logout(user_id: &str) {
    let event = AuthEvent::new(AuthEventType::Logout, Some(user_id), true)
        .with_auth_method("jwt");
    log_auth_event(event);
}

/// Log a token revocation
pub fn log_token_revocation(user_id: &str, reason: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRevocation, Some(user_id), true);

    if let Some(r) = reason {
        event = event.with_details(r);
    }

    log_auth_event(event);
}
