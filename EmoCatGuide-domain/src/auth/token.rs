use thiserror::Error;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Algorithm, Validation};
use std::env;
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::Claims;
use crate::auth::token_blacklist;

/// Default issuer when `JWT_ISSUER` is unset
const DEFAULT_ISSUER: &str = "emo-cat-guide-api";

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Token presented where the other kind was required
    #[error("Expected a {0} token")]
    WrongTokenType(&'static str),

    /// Configuration error
    #[error("Security configuration error: {0}")]
    ConfigError(String),

    /// Token has been revoked
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Generic error
    #[error("Security error: {0}")]
    Generic(String),
}

/// Token types for authentication
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    /// Short-lived access token
    Access,
    /// Long-lived refresh token
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    /// Get the expiration duration for this token type
    pub fn expiration(&self) -> Duration {
        match self {
            TokenType::Access => {
                let expiration_minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse::<i64>()
                    .unwrap_or(15);

                Duration::minutes(expiration_minutes)
            },
            TokenType::Refresh => {
                let expiration_days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse::<i64>()
                    .unwrap_or(7);

                Duration::days(expiration_days)
            }
        }
    }
}

fn jwt_secret() -> Result<String, SecurityError> {
    env::var("JWT_SECRET").map_err(|e| {
        error!("JWT_SECRET environment variable not found: {}", e);
        SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
    })
}

fn jwt_issuer() -> String {
    env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string())
}

/// Fresh id for a login session. Every token issued for the session carries it.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a new JWT token with a fresh token id within `session_id`
pub fn generate_token(
    user_id: &str,
    email: Option<&str>,
    token_type: TokenType,
    session_id: &str,
) -> Result<String, SecurityError> {
    let jwt_secret = jwt_secret()?;

    let now = Utc::now();
    let expiration = now + token_type.expiration();

    let claims = Claims {
        sub: user_id.to_string(),
        iss: jwt_issuer(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.as_str().to_string(),
        email: email.map(str::to_string),
        sid: session_id.to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    ).map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    // Log token generation (but not the token itself)
    info!("Generated {:?} token for user {}", token_type, user_id);
    debug!("Token expiration: {}", expiration);

    Ok(token)
}

/// Validate a JWT token and return the decoded claims
pub fn validate_token(token: &str) -> Result<Claims, SecurityError> {
    let jwt_secret = jwt_secret()?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[jwt_issuer()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    ).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => SecurityError::TokenValidation("Invalid signature".to_string()),
            _ => SecurityError::TokenValidation(e.to_string()),
        }
    })?;

    let claims = &token_data.claims;
    if is_token_revoked(&claims.jti) || (!claims.sid.is_empty() && is_token_revoked(&claims.sid)) {
        return Err(SecurityError::TokenRevoked);
    }

    Ok(token_data.claims)
}

/// Validate a token and require it to be of the given kind
pub fn validate_token_of_type(token: &str, expected: TokenType) -> Result<Claims, SecurityError> {
    let claims = validate_token(token)?;
    if claims.token_type != expected.as_str() {
        return Err(SecurityError::WrongTokenType(expected.as_str()));
    }
    Ok(claims)
}

/// Check if a token has been revoked
fn is_token_revoked(jti: &str) -> bool {
    let is_revoked = token_blacklist::blacklist().is_revoked(jti);
    debug!("Checking if token {} is revoked: {}", jti, is_revoked);
    is_revoked
}

fn record_revocation(id: &str, expiration: SystemTime) -> Result<(), SecurityError> {
    if token_blacklist::blacklist().revoke_token(id, expiration) {
        Ok(())
    } else {
        Err(SecurityError::Generic(format!("token blacklist is full, {} was not revoked", id)))
    }
}

/// Revoke a single token until it would have expired anyway
pub fn revoke_token(claims: &Claims) -> Result<(), SecurityError> {
    info!("Revoking {} token {} for user {}", claims.token_type, claims.jti, claims.sub);

    let expiration = u64::try_from(claims.exp)
        .map(|secs| UNIX_EPOCH + StdDuration::from_secs(secs))
        .map_err(|_| SecurityError::Generic(format!("invalid expiration {}", claims.exp)))?;
    record_revocation(&claims.jti, expiration.max(SystemTime::now()))
}

/// Revoke every token of the session `claims` belongs to.
///
/// The entry outlives any refresh token of the session and any access token
/// minted from one.
pub fn revoke_session(claims: &Claims) -> Result<(), SecurityError> {
    if claims.sid.is_empty() {
        return Err(SecurityError::Generic("token carries no session id".to_string()));
    }
    info!("Revoking session {} for user {}", claims.sid, claims.sub);

    let lifetime = (TokenType::Refresh.expiration() + TokenType::Access.expiration())
        .to_std()
        .map_err(|e| SecurityError::Generic(format!("invalid session lifetime: {}", e)))?;
    record_revocation(&claims.sid, SystemTime::now() + lifetime)
}
