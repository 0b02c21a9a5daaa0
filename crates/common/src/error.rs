//! Error kinds shared by every service and by the gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failure, stable across service boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Unavailable,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A structured, user-facing error.
///
/// Messages never carry storage-engine text; detailed causes are logged where
/// they are converted into this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was rejected before doing any work.
    #[error("{0}")]
    InvalidArgument(String),

    /// A peer service or store could not be reached in time.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else; details stay in the logs.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Builds a not-found error for an entity type and id.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{entity} not found: {id}"))
    }

    /// Builds an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ServiceError::Unavailable(_) => ErrorKind::Unavailable,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the user-facing message.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(m)
            | ServiceError::InvalidArgument(m)
            | ServiceError::Unavailable(m)
            | ServiceError::Internal(m) => m,
        }
    }

    /// Rebuilds an error from its wire representation.
    pub fn from_parts(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::NotFound => ServiceError::NotFound(message),
            ErrorKind::InvalidArgument => ServiceError::InvalidArgument(message),
            ErrorKind::Unavailable => ServiceError::Unavailable(message),
            ErrorKind::Internal => ServiceError::Internal(message),
        }
    }
}

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row with the same key already exists.
    #[error("Duplicate key: {0}")]
    Conflict(String),

    /// The write was abandoned before commit.
    #[error("Write aborted: {0}")]
    Aborted(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Conflict(key) => ServiceError::InvalidArgument(format!("duplicate key: {key}")),
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => {
                tracing::error!(error = %err, "storage unreachable");
                ServiceError::Unavailable("storage unavailable".to_string())
            }
            _ => {
                tracing::error!(error = %err, "storage failure");
                ServiceError::Internal("storage failure".to_string())
            }
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_parts() {
        let err = ServiceError::not_found("account", "A1");
        let rebuilt = ServiceError::from_parts(err.kind(), err.message().to_string());
        assert_eq!(rebuilt, err);
        assert_eq!(err.to_string(), "account not found: A1");
    }

    #[test]
    fn storage_errors_hide_engine_text() {
        let err: ServiceError = StoreError::Aborted("line items rejected".into()).into();
        assert_eq!(err, ServiceError::Internal("storage failure".into()));

        let err: ServiceError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn error_kind_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ErrorKind::InvalidArgument).unwrap();
        assert_eq!(json, "\"invalid_argument\"");
    }
}
