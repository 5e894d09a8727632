use std::sync::PoisonError;
use thiserror::Error;
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File store error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// Whether the error came from the storage backend rather than the caller's input.
    /// Repositories only fall back to in-memory storage for backend errors.
    pub fn is_backend_failure(&self) -> bool {
        !matches!(
            self,
            RepositoryError::Validation(_) | RepositoryError::NotFound(_) | RepositoryError::Conflict(_)
        )
    }
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

impl From<String> for RepositoryError {
    fn from(error: String) -> Self {
        if error.contains("validation") || error.contains("invalid") {
            RepositoryError::Validation(error)
        } else {
            RepositoryError::Database(DatabaseError::GenericError(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failure_classification() {
        assert!(!RepositoryError::Conflict("email".into()).is_backend_failure());
        assert!(!RepositoryError::Validation("bad".into()).is_backend_failure());
        assert!(RepositoryError::Lock("poisoned".into()).is_backend_failure());
        assert!(RepositoryError::Database(DatabaseError::PoolNotInitialized).is_backend_failure());
    }

    #[test]
    fn test_from_string_picks_validation() {
        let err: RepositoryError = "invalid email".to_string().into();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let err: RepositoryError = "disk full".to_string().into();
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
