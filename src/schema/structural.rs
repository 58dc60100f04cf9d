//! Builder-side structural validation
//!
//! Checks that a form definition is complete enough to be saved:
//! - every field has a label
//! - select fields have options, all of them labeled
//! - every validation rule has a type, an operand and a message
//!
//! Only label and option checks set the field-level error. Rule errors are
//! attached to the rule itself and do not block a save.

use serde_json::Value;

use super::types::{Field, FieldType, SelectOption, ValidationRule};

pub const LABEL_REQUIRED: &str = "Label is required.";
pub const SELECT_NEEDS_OPTIONS: &str = "Select field must have options.";
pub const SELECT_OPTIONS_INCOMPLETE: &str = "All select options must have a value.";
pub const OPTION_EMPTY: &str = "Option cannot be empty.";
pub const RULE_TYPE_REQUIRED: &str = "Validation type is required.";
pub const RULE_VALUE_REQUIRED: &str = "Validation value is required.";
pub const RULE_MESSAGE_REQUIRED: &str = "Validation message is required.";

/// Structural validator for form definitions.
///
/// Validation is pure: the input is never touched and the output differs
/// from it only in `error` annotations. Running the validator on its own
/// output yields the same annotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate every field, option and rule with its current error.
    pub fn validate(&self, fields: &[Field]) -> Vec<Field> {
        fields.iter().map(|field| self.validate_field(field)).collect()
    }

    /// Annotate a single field.
    pub fn validate_field(&self, field: &Field) -> Field {
        let mut validated = field.clone();

        let mut error = None;
        if is_blank(&field.label) {
            error = Some(LABEL_REQUIRED);
        }

        if field.field_type == FieldType::Select && !field.options.is_empty() {
            validated.options = field.options.iter().map(check_option).collect();
            if validated.options.iter().any(|o| o.error.is_some()) {
                error = error.or(Some(SELECT_OPTIONS_INCOMPLETE));
            }
        } else {
            // Options of non-select fields are not inspected.
            for option in &mut validated.options {
                option.error = None;
            }
            if field.field_type == FieldType::Select {
                error = error.or(Some(SELECT_NEEDS_OPTIONS));
            }
        }

        validated.validations = field.validations.iter().map(check_rule).collect();
        validated.error = error.map(str::to_string);
        validated
    }

    /// True when the field-level checks pass. Rule errors are not considered.
    pub fn is_field_valid(&self, field: &Field) -> bool {
        !self.validate_field(field).has_error()
    }
}

/// A validated form may be saved iff it is non-empty and no field carries a
/// field-level error.
pub fn can_save(validated: &[Field]) -> bool {
    !validated.is_empty() && validated.iter().all(|f| !f.has_error())
}

fn check_option(option: &SelectOption) -> SelectOption {
    SelectOption {
        error: is_blank(&option.label).then(|| OPTION_EMPTY.to_string()),
        ..option.clone()
    }
}

fn check_rule(rule: &ValidationRule) -> ValidationRule {
    let error = if rule.rule_type.is_none() {
        Some(RULE_TYPE_REQUIRED)
    } else if is_missing_operand(rule.value.as_ref()) {
        Some(RULE_VALUE_REQUIRED)
    } else if rule.message.as_deref().map_or(true, is_blank) {
        Some(RULE_MESSAGE_REQUIRED)
    } else {
        None
    };

    ValidationRule {
        error: error.map(str::to_string),
        ..rule.clone()
    }
}

// Whitespace operands are legal: " " is a valid equality target.
fn is_missing_operand(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::RuleType;

    fn select(label: &str, options: &[&str]) -> Field {
        let mut field = Field::new(1, label, FieldType::Select);
        for (i, label) in options.iter().enumerate() {
            field.options.push(SelectOption::new(10 + i as u32, *label));
        }
        field
    }

    #[test]
    fn test_blank_label() {
        let validated =
            StructuralValidator::new().validate_field(&Field::new(1, "   ", FieldType::Text));
        assert_eq!(validated.error.as_deref(), Some(LABEL_REQUIRED));
    }

    #[test]
    fn test_label_error_wins_over_select_error() {
        let validated = StructuralValidator::new().validate_field(&select("", &[]));
        assert_eq!(validated.error.as_deref(), Some(LABEL_REQUIRED));
    }

    #[test]
    fn test_option_errors_computed_under_label_error() {
        let validated = StructuralValidator::new().validate_field(&select("", &["a", " "]));
        assert_eq!(validated.error.as_deref(), Some(LABEL_REQUIRED));
        assert_eq!(validated.options[0].error, None);
        assert_eq!(validated.options[1].error.as_deref(), Some(OPTION_EMPTY));
    }

    #[test]
    fn test_select_without_options() {
        let validated = StructuralValidator::new().validate_field(&select("Color", &[]));
        assert_eq!(validated.error.as_deref(), Some(SELECT_NEEDS_OPTIONS));
    }

    #[test]
    fn test_select_with_blank_option() {
        let validated = StructuralValidator::new().validate_field(&select("Color", &["Red", ""]));
        assert_eq!(validated.error.as_deref(), Some(SELECT_OPTIONS_INCOMPLETE));
        assert_eq!(validated.options[1].error.as_deref(), Some(OPTION_EMPTY));
    }

    #[test]
    fn test_options_ignored_for_non_select() {
        let mut field = Field::new(1, "Name", FieldType::Text);
        field.options.push(SelectOption::blank(2));
        let validated = StructuralValidator::new().validate_field(&field);
        assert_eq!(validated.error, None);
        assert_eq!(validated.options[0].error, None);
    }

    #[test]
    fn test_rule_checks_in_order() {
        let mut rule = ValidationRule {
            id: 5,
            rule_type: None,
            value: None,
            message: None,
            error: None,
        };
        assert_eq!(check_rule(&rule).error.as_deref(), Some(RULE_TYPE_REQUIRED));

        rule.rule_type = Some(RuleType::Min);
        assert_eq!(check_rule(&rule).error.as_deref(), Some(RULE_VALUE_REQUIRED));

        rule.value = Some(Value::String(String::new()));
        assert_eq!(check_rule(&rule).error.as_deref(), Some(RULE_VALUE_REQUIRED));

        rule.value = Some(Value::from(0));
        assert_eq!(check_rule(&rule).error.as_deref(), Some(RULE_MESSAGE_REQUIRED));

        rule.message = Some("  ".into());
        assert_eq!(check_rule(&rule).error.as_deref(), Some(RULE_MESSAGE_REQUIRED));

        rule.message = Some("Too small".into());
        assert_eq!(check_rule(&rule).error, None);
    }

    #[test]
    fn test_rule_errors_do_not_set_field_error() {
        let field = Field::new(1, "Name", FieldType::Text).with_rule(ValidationRule::blank(2));
        let validated = StructuralValidator::new().validate(&[field]);
        assert_eq!(validated[0].error, None);
        assert_eq!(validated[0].validations[0].error.as_deref(), Some(RULE_VALUE_REQUIRED));
        assert!(can_save(&validated));
    }

    #[test]
    fn test_validation_clears_stale_errors() {
        let mut field = Field::new(1, "Name", FieldType::Text);
        field.error = Some(LABEL_REQUIRED.into());
        let validated = StructuralValidator::new().validate_field(&field);
        assert_eq!(validated.error, None);
    }

    #[test]
    fn test_option_errors_cleared_after_type_change() {
        let validator = StructuralValidator::new();
        let mut field = validator.validate_field(&select("Size", &[""]));
        assert_eq!(field.options[0].error.as_deref(), Some(OPTION_EMPTY));

        field.field_type = FieldType::Text;
        let validated = validator.validate_field(&field);
        assert_eq!(validated.error, None);
        assert_eq!(validated.options[0].error, None);
    }

    #[test]
    fn test_can_save_requires_fields() {
        assert!(!can_save(&[]));
    }
}
