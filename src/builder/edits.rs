//! Edits the builder applies to fields and rules.
//!
//! Edits never mutate in place: each produces the replacement value.

use serde_json::Value;

use crate::schema::{Field, FieldType, RuleType, ValidationRule};

/// A single change to a field's own properties
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Label(String),
    Placeholder(String),
    Required(bool),
    Type(FieldType),
    DefaultValue(Value),
}

impl FieldEdit {
    /// Produce the edited copy of `field`
    pub fn apply(&self, field: &Field) -> Field {
        let mut next = field.clone();
        match self {
            FieldEdit::Label(label) => next.label = label.clone(),
            FieldEdit::Placeholder(text) => next.placeholder = Some(text.clone()),
            FieldEdit::Required(required) => next.is_required = *required,
            FieldEdit::Type(field_type) => next.field_type = *field_type,
            FieldEdit::DefaultValue(value) => {
                next.default_value = (!value.is_null()).then(|| value.clone())
            }
        }
        next
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            FieldEdit::Label(_) => "label",
            FieldEdit::Placeholder(_) => "placeholder",
            FieldEdit::Required(_) => "isRequired",
            FieldEdit::Type(_) => "type",
            FieldEdit::DefaultValue(_) => "defaultValue",
        }
    }
}

/// A single change to a validation rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEdit {
    /// `None` clears the rule kind
    Type(Option<RuleType>),
    /// `Value::Null` clears the operand
    Value(Value),
    Message(String),
}

impl RuleEdit {
    /// Produce the edited copy of `rule`
    pub fn apply(&self, rule: &ValidationRule) -> ValidationRule {
        let mut next = rule.clone();
        match self {
            RuleEdit::Type(rule_type) => next.rule_type = *rule_type,
            RuleEdit::Value(value) => next.value = (!value.is_null()).then(|| value.clone()),
            RuleEdit::Message(message) => next.message = Some(message.clone()),
        }
        next
    }
}
