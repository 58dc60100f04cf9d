//! # Renderer Errors

use thiserror::Error;

use crate::schema::EntityId;
use crate::storage::StorageError;

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Renderer errors
#[derive(Debug, Clone, Error)]
pub enum RendererError {
    #[error("Unknown field: {0}")]
    UnknownField(EntityId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RendererError {
    /// Stable code for CLI output and logs
    pub fn code(&self) -> &'static str {
        match self {
            RendererError::UnknownField(_) => "FORM_RENDERER_UNKNOWN_FIELD",
            RendererError::Storage(e) => e.code(),
        }
    }
}
