//! Form definition types shared by the builder and the renderer
//!
//! Supported field types:
//! - text: free text, length rules apply
//! - email: free text, only equality and regex rules apply
//! - number: numeric input, value rules apply
//! - select: one choice out of a non-empty option list
//!
//! `error` members are derived annotations written by the structural
//! validator. They are never authoritative state.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of a field, option or validation rule
pub type EntityId = u32;

/// Identifier of a stored form
pub type FormId = u32;

/// Supported field types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text input
    #[default]
    Text,
    /// Email address input
    Email,
    /// Numeric input
    Number,
    /// Single choice out of `options`
    Select,
}

/// Validation rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Value must be strictly equal to the operand
    Equal,
    /// Lower bound on length (text) or value (number)
    Min,
    /// Upper bound on length (text) or value (number)
    Max,
    /// Value must match the operand pattern
    Regex,
    /// Reserved. Evaluated like `Equal`.
    Required,
}

impl RuleType {
    /// Parses a rule name. Blank input means "no type chosen yet".
    pub fn parse(name: &str) -> Option<RuleType> {
        match name.trim() {
            "equal" => Some(RuleType::Equal),
            "min" => Some(RuleType::Min),
            "max" => Some(RuleType::Max),
            "regex" => Some(RuleType::Regex),
            "required" => Some(RuleType::Required),
            _ => None,
        }
    }
}

/// One selectable choice of a select field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SelectOption {
    /// Create an option with an empty label
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            label: String::new(),
            error: None,
        }
    }

    /// Create a labeled option
    pub fn new(id: EntityId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            error: None,
        }
    }
}

/// A constraint attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub id: EntityId,
    /// `None` while the user has not picked a rule kind
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_rule_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub rule_type: Option<RuleType>,
    /// Comparison operand; meaning depends on `rule_type` and the field type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationRule {
    /// A freshly added rule: `equal` with empty operand and message
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            rule_type: Some(RuleType::Equal),
            value: Some(Value::String(String::new())),
            message: Some(String::new()),
            error: None,
        }
    }

    /// Create a complete rule
    pub fn new(
        id: EntityId,
        rule_type: RuleType,
        value: impl Into<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            rule_type: Some(rule_type),
            value: Some(value.into()),
            message: Some(message.into()),
            error: None,
        }
    }

    /// The custom failure message, if one was written
    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

fn deserialize_rule_type<'de, D>(deserializer: D) -> Result<Option<RuleType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(name) if name.trim().is_empty() => Ok(None),
        Some(name) => RuleType::parse(&name)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown validation type '{}'", name))),
    }
}

/// One form element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Field {
    /// A freshly added field: blank text field with no options or rules
    pub fn blank(id: EntityId) -> Self {
        Self {
            id,
            label: String::new(),
            field_type: FieldType::Text,
            is_required: false,
            placeholder: Some(String::new()),
            default_value: Some(Value::String(String::new())),
            options: Vec::new(),
            validations: Vec::new(),
            is_active: true,
            error: None,
        }
    }

    /// Create a labeled field of the given type
    pub fn new(id: EntityId, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
            ..Self::blank(id)
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Append an option
    pub fn with_option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    /// Append a validation rule
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validations.push(rule);
        self
    }

    /// Returns true if this field or any nested option or rule carries an error
    pub fn has_any_error(&self) -> bool {
        has_text(&self.error)
            || self.options.iter().any(|o| has_text(&o.error))
            || self.validations.iter().any(|r| has_text(&r.error))
    }

    /// Returns true if the field-level error is set
    pub fn has_error(&self) -> bool {
        has_text(&self.error)
    }

    /// Strip every derived annotation, field and nested
    pub fn clear_errors(&mut self) {
        self.error = None;
        for option in &mut self.options {
            option.error = None;
        }
        for rule in &mut self.validations {
            rule.error = None;
        }
    }

    /// Copy of the field without derived annotations
    pub fn without_errors(&self) -> Self {
        let mut field = self.clone();
        field.clear_errors();
        field
    }

    pub fn option(&self, option_id: EntityId) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn rule(&self, rule_id: EntityId) -> Option<&ValidationRule> {
        self.validations.iter().find(|r| r.id == rule_id)
    }
}

fn has_text(error: &Option<String>) -> bool {
    error.as_deref().is_some_and(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_field_shape() {
        let field = Field::blank(123456);
        assert_eq!(field.field_type, FieldType::Text);
        assert!(field.label.is_empty());
        assert!(field.options.is_empty());
        assert!(field.validations.is_empty());
        assert!(field.is_active);
        assert!(!field.is_required);
    }

    #[test]
    fn test_field_serializes_camel_case() {
        let field = Field::new(1, "Age", FieldType::Number).required();
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "number");
        assert_eq!(value["isRequired"], true);
        assert_eq!(value["isActive"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_blank_rule_type_deserializes_to_none() {
        let rule: ValidationRule =
            serde_json::from_value(json!({"id": 7, "type": "  ", "value": 3, "message": "m"}))
                .unwrap();
        assert_eq!(rule.rule_type, None);

        let rule: ValidationRule = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(rule.rule_type, None);
        assert_eq!(rule.value, None);
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let result: Result<ValidationRule, _> =
            serde_json::from_value(json!({"id": 7, "type": "between"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_rule_value_is_absent() {
        let rule: ValidationRule =
            serde_json::from_value(json!({"id": 1, "type": "min", "value": null})).unwrap();
        assert_eq!(rule.value, None);
    }

    #[test]
    fn test_clear_errors_strips_nested() {
        let mut field = Field::new(1, "Pick", FieldType::Select)
            .with_option(SelectOption::blank(2))
            .with_rule(ValidationRule::blank(3));
        field.error = Some("x".into());
        field.options[0].error = Some("y".into());
        field.validations[0].error = Some("z".into());
        assert!(field.has_any_error());

        field.clear_errors();
        assert!(!field.has_any_error());
    }

    #[test]
    fn test_empty_error_is_not_an_error() {
        let mut field = Field::blank(1);
        field.error = Some(String::new());
        assert!(!field.has_error());
    }

    #[test]
    fn test_custom_message_ignores_empty() {
        let mut rule = ValidationRule::new(1, RuleType::Max, 5, "");
        assert_eq!(rule.custom_message(), None);
        rule.message = Some("Too long".into());
        assert_eq!(rule.custom_message(), Some("Too long"));
    }
}
