use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use emo_cat_guide_domain::services::ServiceError;

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", format!("The requested {} could not be found", resource))
    }

    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("bad_request", message)
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self::new("payload_too_large", message)
    }

    /// Internal details are logged by the caller, never returned
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" | "precondition_failed" => StatusCode::CONFLICT,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new("validation_error", msg),
            ServiceError::Unauthorized(msg) => Self::new("unauthorized", msg),
            ServiceError::NotFound(msg) => Self::new("not_found", msg),
            ServiceError::Conflict(msg) => Self::new("conflict", msg),
            ServiceError::Precondition(msg) => Self::new("precondition_failed", msg),
            ServiceError::PayloadTooLarge(msg) => Self::payload_too_large(&msg),
            ServiceError::Repository(msg) | ServiceError::Internal(msg) => {
                error!("Request failed: {}", msg);
                Self::internal_error()
            }
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
