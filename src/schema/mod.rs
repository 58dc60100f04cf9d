//! Form schema subsystem
//!
//! The data model shared by builder and renderer, and the two validators
//! that guard it:
//!
//! - Structural validation before save (builder side)
//! - Runtime validation of entered values (renderer side)
//!
//! Both validators are pure and deterministic.

mod ids;
mod runtime;
mod structural;
mod types;

pub use ids::{IdGenerator, MAX_ID, MIN_ID};
pub use runtime::{FieldErrors, RuntimeValidator, FIELD_REQUIRED, INVALID_FORMAT, NOT_EQUAL};
pub use structural::{
    can_save, StructuralValidator, LABEL_REQUIRED, OPTION_EMPTY, RULE_MESSAGE_REQUIRED,
    RULE_TYPE_REQUIRED, RULE_VALUE_REQUIRED, SELECT_NEEDS_OPTIONS, SELECT_OPTIONS_INCOMPLETE,
};
pub use types::{EntityId, Field, FieldType, FormId, RuleType, SelectOption, ValidationRule};
