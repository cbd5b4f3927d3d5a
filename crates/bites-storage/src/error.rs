//! Error types for bites-storage

use bites_core::KeyError;
use bites_core::protocol::status;
use thiserror::Error;

/// Failures of the underlying persistent store
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while preparing the database location
    #[error("I/O error: {0}")]
    Io(String),

    /// Error reported by the database engine
    #[error("Database error: {0}")]
    Database(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

macro_rules! from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(err: $ty) -> Self {
                    StorageError::Database(err.to_string())
                }
            }
        )*
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Outcome of a storage service operation that did not succeed
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed kind or conversation, rejected before any store access
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// An item already exists at this identity
    #[error("Conflict: {0} is already stored")]
    Conflict(String),

    /// Point lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store failed underneath
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<KeyError> for ServiceError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidIdentity(msg) | KeyError::KeyParse(msg) => {
                ServiceError::InvalidIdentity(msg)
            }
        }
    }
}

impl ServiceError {
    /// Reply status for this outcome
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidIdentity(_) => status::BAD_REQUEST,
            ServiceError::Conflict(_) => status::CONFLICT,
            ServiceError::NotFound(_) => status::NOT_FOUND,
            ServiceError::Storage(_) => status::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }

    #[test]
    fn test_service_error_status() {
        assert_eq!(ServiceError::InvalidIdentity("x".into()).status(), 400);
        assert_eq!(ServiceError::Conflict("x".into()).status(), 409);
        assert_eq!(ServiceError::NotFound("x".into()).status(), 404);
        assert_eq!(
            ServiceError::Storage(StorageError::Database("disk".into())).status(),
            500
        );
    }

    #[test]
    fn test_key_error_is_request_level() {
        let err: ServiceError = KeyError::InvalidIdentity("a@b".into()).into();
        assert!(matches!(err, ServiceError::InvalidIdentity(msg) if msg == "a@b"));
    }
}
