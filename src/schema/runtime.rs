//! Renderer-side runtime validation of submitted values
//!
//! Order of checks:
//! 1. Required fields reject null and empty-string values
//! 2. Rules run in stored order; the first failing rule decides the message
//!
//! Length, bound and pattern rules only look at truthy values, so an empty
//! optional field passes them. Equality rules always apply.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use regex::Regex;
use serde_json::Value;

use super::types::{EntityId, Field, FieldType, RuleType, ValidationRule};
use crate::observability::Logger;

pub const FIELD_REQUIRED: &str = "Field is required";
pub const INVALID_FORMAT: &str = "Invalid format.";
pub const NOT_EQUAL: &str = "Value should be equal";

/// Per-field error map produced by a full validation pass
pub type FieldErrors = BTreeMap<EntityId, Option<String>>;

/// Runtime validator. Holds a cache of compiled patterns and is otherwise
/// stateless.
#[derive(Debug, Default)]
pub struct RuntimeValidator {
    patterns: RwLock<HashMap<String, Option<Regex>>>,
}

impl RuntimeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one value against one field. Returns the error message, or
    /// `None` if the value is acceptable.
    pub fn validate(&self, field: &Field, value: &Value) -> Option<String> {
        if field.is_required && is_empty(value) {
            return Some(FIELD_REQUIRED.to_string());
        }

        field
            .validations
            .iter()
            .find_map(|rule| self.check_rule(field.field_type, rule, value))
    }

    /// Validate every field of a form. Fields without an entry in `values`
    /// are validated against `null`.
    pub fn validate_all(
        &self,
        fields: &[Field],
        values: &BTreeMap<EntityId, Value>,
    ) -> FieldErrors {
        fields
            .iter()
            .map(|field| {
                let value = values.get(&field.id).unwrap_or(&Value::Null);
                (field.id, self.validate(field, value))
            })
            .collect()
    }

    fn check_rule(
        &self,
        field_type: FieldType,
        rule: &ValidationRule,
        value: &Value,
    ) -> Option<String> {
        let operand = rule.value.as_ref().unwrap_or(&Value::Null);

        match rule.rule_type {
            Some(RuleType::Max) => {
                let (actual, kind) = measure(field_type, value)?;
                let bound = to_number(operand)?;
                (actual > bound).then(|| {
                    message_or(rule, || format!("Maximum {} is {}.", kind, display(operand)))
                })
            }
            Some(RuleType::Min) => {
                let (actual, kind) = measure(field_type, value)?;
                let bound = to_number(operand)?;
                (actual < bound).then(|| {
                    message_or(rule, || format!("Minimum {} is {}.", kind, display(operand)))
                })
            }
            Some(RuleType::Regex) => {
                let text = value.as_str().filter(|s| !s.is_empty())?;
                let matched = self.matches(&display(operand), text);
                (!matched).then(|| message_or(rule, || INVALID_FORMAT.to_string()))
            }
            _ => (!strict_equals(value, operand))
                .then(|| message_or(rule, || NOT_EQUAL.to_string())),
        }
    }

    fn matches(&self, pattern: &str, text: &str) -> bool {
        if let Ok(cache) = self.patterns.read() {
            if let Some(compiled) = cache.get(pattern) {
                return compiled.as_ref().is_some_and(|re| re.is_match(text));
            }
        }

        let compiled = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                let reason = e.to_string();
                Logger::warn(
                    "INVALID_PATTERN",
                    &[("pattern", pattern), ("reason", reason.as_str())],
                );
                None
            }
        };
        let matched = compiled.as_ref().is_some_and(|re| re.is_match(text));

        if let Ok(mut cache) = self.patterns.write() {
            cache.insert(pattern.to_string(), compiled);
        }
        matched
    }
}

/// Quantity a bound rule compares against, with the word used in the
/// default message. Only text and number fields are measured, and only
/// truthy values.
fn measure(field_type: FieldType, value: &Value) -> Option<(f64, &'static str)> {
    if !is_truthy(value) {
        return None;
    }
    match field_type {
        FieldType::Text => length(value).map(|len| (len as f64, "length")),
        FieldType::Number => to_number(value).map(|n| (n, "value")),
        FieldType::Email | FieldType::Select => None,
    }
}

fn message_or(rule: &ValidationRule, default: impl FnOnce() -> String) -> String {
    rule.custom_message()
        .map(str::to_string)
        .unwrap_or_else(default)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Numeric coercion. `None` stands for NaN, which fails every comparison.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => a == b,
    }
}

/// Render an operand the way it was typed.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_with(rule: ValidationRule) -> Field {
        Field::new(1, "Name", FieldType::Text).with_rule(rule)
    }

    fn number_with(rule: ValidationRule) -> Field {
        Field::new(1, "Age", FieldType::Number).with_rule(rule)
    }

    #[test]
    fn test_required_short_circuits() {
        let field = text_with(ValidationRule::new(2, RuleType::Equal, "x", "custom")).required();
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("")).as_deref(), Some(FIELD_REQUIRED));
        assert_eq!(v.validate(&field, &Value::Null).as_deref(), Some(FIELD_REQUIRED));
    }

    #[test]
    fn test_required_accepts_zero() {
        let field = Field::new(1, "Count", FieldType::Number).required();
        assert_eq!(RuntimeValidator::new().validate(&field, &json!(0)), None);
    }

    #[test]
    fn test_text_max_length() {
        let field = text_with(ValidationRule::new(2, RuleType::Max, 5, ""));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("abcdef")).as_deref(), Some("Maximum length is 5."));
        assert_eq!(v.validate(&field, &json!("abcde")), None);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let field = text_with(ValidationRule::new(2, RuleType::Max, 3, ""));
        assert_eq!(RuntimeValidator::new().validate(&field, &json!("äöü")), None);
    }

    #[test]
    fn test_text_min_custom_message() {
        let field = text_with(ValidationRule::new(2, RuleType::Min, "3", "Too short"));
        assert_eq!(
            RuntimeValidator::new().validate(&field, &json!("ab")).as_deref(),
            Some("Too short")
        );
    }

    #[test]
    fn test_number_min_value() {
        let field = number_with(ValidationRule::new(2, RuleType::Min, 10, ""));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!(5)).as_deref(), Some("Minimum value is 10."));
        assert_eq!(v.validate(&field, &json!("5")).as_deref(), Some("Minimum value is 10."));
        assert_eq!(v.validate(&field, &json!(10)), None);
    }

    #[test]
    fn test_number_max_value() {
        let field = number_with(ValidationRule::new(2, RuleType::Max, 2.5, ""));
        assert_eq!(
            RuntimeValidator::new().validate(&field, &json!(3)).as_deref(),
            Some("Maximum value is 2.5.")
        );
    }

    #[test]
    fn test_bounds_skip_falsy_values() {
        let field = number_with(ValidationRule::new(2, RuleType::Min, 10, ""));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!(0)), None);
        assert_eq!(v.validate(&field, &json!("")), None);
        assert_eq!(v.validate(&field, &Value::Null), None);
    }

    #[test]
    fn test_bounds_ignored_for_email_and_select() {
        let rule = ValidationRule::new(2, RuleType::Max, 1, "");
        let v = RuntimeValidator::new();
        let email = Field::new(1, "Mail", FieldType::Email).with_rule(rule.clone());
        let select = Field::new(1, "Pick", FieldType::Select).with_rule(rule);
        assert_eq!(v.validate(&email, &json!("a@b.c")), None);
        assert_eq!(v.validate(&select, &json!("long choice")), None);
    }

    #[test]
    fn test_non_numeric_bound_has_no_effect() {
        let field = text_with(ValidationRule::new(2, RuleType::Max, "five", ""));
        assert_eq!(RuntimeValidator::new().validate(&field, &json!("abcdefgh")), None);
    }

    #[test]
    fn test_regex() {
        let field = text_with(ValidationRule::new(2, RuleType::Regex, "^[0-9]+$", ""));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("12a")).as_deref(), Some(INVALID_FORMAT));
        assert_eq!(v.validate(&field, &json!("123")), None);
        assert_eq!(v.validate(&field, &json!("")), None);
    }

    #[test]
    fn test_regex_is_unanchored_search() {
        let field = text_with(ValidationRule::new(2, RuleType::Regex, "[0-9]", ""));
        assert_eq!(RuntimeValidator::new().validate(&field, &json!("ab1")), None);
    }

    #[test]
    fn test_invalid_regex_fails_with_rule_message() {
        let field = text_with(ValidationRule::new(2, RuleType::Regex, "(", "Bad pattern"));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("x")).as_deref(), Some("Bad pattern"));
        // served from cache the second time
        assert_eq!(v.validate(&field, &json!("y")).as_deref(), Some("Bad pattern"));
    }

    #[test]
    fn test_equal_is_strict() {
        let field = text_with(ValidationRule::new(2, RuleType::Equal, "yes", ""));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("yes")), None);
        assert_eq!(v.validate(&field, &json!("no")).as_deref(), Some(NOT_EQUAL));

        let field = number_with(ValidationRule::new(2, RuleType::Equal, "5", ""));
        assert_eq!(v.validate(&field, &json!(5)).as_deref(), Some(NOT_EQUAL));
    }

    #[test]
    fn test_equal_compares_numbers_numerically() {
        let field = number_with(ValidationRule::new(2, RuleType::Equal, 5, ""));
        assert_eq!(RuntimeValidator::new().validate(&field, &json!(5.0)), None);
    }

    #[test]
    fn test_equal_applies_to_empty_optional_value() {
        let field = text_with(ValidationRule::new(2, RuleType::Equal, "yes", ""));
        assert_eq!(
            RuntimeValidator::new().validate(&field, &json!("")).as_deref(),
            Some(NOT_EQUAL)
        );
    }

    #[test]
    fn test_reserved_required_rule_behaves_like_equal() {
        let field = text_with(ValidationRule::new(2, RuleType::Required, "x", ""));
        assert_eq!(
            RuntimeValidator::new().validate(&field, &json!("y")).as_deref(),
            Some(NOT_EQUAL)
        );
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let field = Field::new(1, "Code", FieldType::Text)
            .with_rule(ValidationRule::new(2, RuleType::Min, 2, "first"))
            .with_rule(ValidationRule::new(3, RuleType::Regex, "^[a-z]+$", "second"));
        let v = RuntimeValidator::new();
        assert_eq!(v.validate(&field, &json!("1")).as_deref(), Some("first"));
        assert_eq!(v.validate(&field, &json!("12")).as_deref(), Some("second"));
    }

    #[test]
    fn test_whitespace_message_returned_verbatim() {
        let field = text_with(ValidationRule::new(2, RuleType::Max, 1, " "));
        assert_eq!(RuntimeValidator::new().validate(&field, &json!("ab")).as_deref(), Some(" "));
    }

    #[test]
    fn test_validate_all_covers_missing_values() {
        let fields = vec![
            Field::new(1, "A", FieldType::Text).required(),
            Field::new(2, "B", FieldType::Text),
        ];
        let mut values = BTreeMap::new();
        values.insert(2, json!("hello"));

        let errors = RuntimeValidator::new().validate_all(&fields, &values);
        assert_eq!(errors[&1].as_deref(), Some(FIELD_REQUIRED));
        assert_eq!(errors[&2], None);
    }

    #[test]
    fn test_display_operand() {
        assert_eq!(display(&json!(5)), "5");
        assert_eq!(display(&json!(5.0)), "5");
        assert_eq!(display(&json!(2.5)), "2.5");
        assert_eq!(display(&json!("7")), "7");
    }
}
