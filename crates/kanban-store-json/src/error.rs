//! Error types for JSON document store operations.

use thiserror::Error;

/// Errors that can occur during `JsonStore` operations.
#[derive(Error, Debug)]
pub enum JsonStoreError {
    /// Board document was not found.
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    /// Task document was not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Failed to encode or decode the database file.
    #[error("Failed to (de)serialize database: {0}")]
    Serde(#[from] serde_json::Error),

    /// Failed to replace the database file with the freshly written copy.
    #[error("Failed to persist database: {0}")]
    Persist(String),

    /// Failed to acquire the store lock.
    #[error("Store lock error")]
    LockError,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<tempfile::PersistError> for JsonStoreError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Persist(err.error.to_string())
    }
}
