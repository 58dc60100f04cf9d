//! # Builder Errors

use thiserror::Error;

use crate::schema::EntityId;
use crate::storage::StorageError;

/// Result type for builder operations
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Builder errors
#[derive(Debug, Clone, Error)]
pub enum BuilderError {
    #[error("Field not found: {0}")]
    FieldNotFound(EntityId),

    #[error("Option {option_id} not found in field {field_id}")]
    OptionNotFound { field_id: EntityId, option_id: EntityId },

    #[error("Validation {rule_id} not found in field {field_id}")]
    RuleNotFound { field_id: EntityId, rule_id: EntityId },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BuilderError {
    /// Stable code for CLI output and logs
    pub fn code(&self) -> &'static str {
        match self {
            BuilderError::FieldNotFound(_) => "FORM_BUILDER_FIELD_NOT_FOUND",
            BuilderError::OptionNotFound { .. } => "FORM_BUILDER_OPTION_NOT_FOUND",
            BuilderError::RuleNotFound { .. } => "FORM_BUILDER_RULE_NOT_FOUND",
            BuilderError::Storage(e) => e.code(),
        }
    }
}
