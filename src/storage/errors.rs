//! # Form Storage Errors

use thiserror::Error;

use crate::schema::FormId;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Form storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Form id is required")]
    MissingFormId,

    #[error("Store is closed")]
    Closed,

    #[error("Store corrupted: {0}")]
    Corrupted(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Stable code for CLI output and logs
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::FormNotFound(_) => "FORM_STORE_NOT_FOUND",
            StorageError::MissingFormId => "FORM_STORE_MISSING_ID",
            StorageError::Closed => "FORM_STORE_CLOSED",
            StorageError::Corrupted(_) => "FORM_STORE_CORRUPTED",
            StorageError::Io(_) => "FORM_STORE_IO",
            StorageError::Serialization(_) => "FORM_STORE_SERIALIZATION",
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
