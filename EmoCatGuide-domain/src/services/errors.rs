use thiserror::Error;
use emo_cat_guide_data::repository::RepositoryError;

use crate::auth::token::SecurityError;

/// Errors returned by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad credentials or token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required earlier step has not been completed
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Upload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Repository error
    #[error("Repository error: {0}")]
    Repository(String),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => ServiceError::Validation(msg),
            RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
            _ => ServiceError::Repository(err.to_string()),
        }
    }
}

impl From<SecurityError> for ServiceError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::ConfigError(msg) | SecurityError::Generic(msg) => ServiceError::Internal(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Flatten `validator` errors into one readable message
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}
