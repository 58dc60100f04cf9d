//! Renderer controller
//!
//! Every value change triggers a full validation pass over the form, so
//! errors shown for untouched fields always reflect the current values.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::observability::Logger;
use crate::schema::{EntityId, Field, FieldErrors, FormId, RuntimeValidator};
use crate::storage::FormStore;

use super::errors::{RendererError, RendererResult};

/// Result of a submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Every field passed; the submitted values
    Accepted(BTreeMap<EntityId, Value>),
    /// Fields that failed, with their messages
    Rejected(BTreeMap<EntityId, String>),
}

/// Renderer-side controller for the stored form
#[derive(Debug)]
pub struct RendererController {
    form_id: Option<FormId>,
    fields: Vec<Field>,
    values: BTreeMap<EntityId, Value>,
    errors: FieldErrors,
    validator: RuntimeValidator,
}

impl RendererController {
    /// Load the first stored form. An empty store renders an empty form.
    pub async fn load(store: &dyn FormStore) -> RendererResult<Self> {
        let forms = store.get_all_forms().await.map_err(|e| {
            let reason = e.to_string();
            Logger::error("FORM_LOAD_FAILED", &[("reason", reason.as_str())]);
            RendererError::from(e)
        })?;

        match forms.into_iter().next() {
            Some(record) => {
                Logger::info(
                    "FORM_RENDERED",
                    &[
                        ("fields", record.fields.len().to_string().as_str()),
                        ("form_id", record.form_id.to_string().as_str()),
                    ],
                );
                Ok(Self::from_fields(Some(record.form_id), record.fields))
            }
            None => {
                Logger::warn("FORM_NOT_FOUND", &[]);
                Ok(Self::from_fields(None, Vec::new()))
            }
        }
    }

    /// Render a field list directly. Every value starts as `""`.
    pub fn from_fields(form_id: Option<FormId>, fields: Vec<Field>) -> Self {
        let values = fields
            .iter()
            .map(|f| (f.id, Value::String(String::new())))
            .collect();
        Self {
            form_id,
            fields,
            values,
            errors: FieldErrors::new(),
            validator: RuntimeValidator::new(),
        }
    }

    pub fn form_id(&self) -> Option<FormId> {
        self.form_id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn values(&self) -> &BTreeMap<EntityId, Value> {
        &self.values
    }

    /// Errors from the latest validation pass
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field_id: EntityId) -> Option<&str> {
        self.errors.get(&field_id).and_then(|e| e.as_deref())
    }

    /// True when the latest pass found no errors
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Option::is_none)
    }

    /// Record a value and revalidate the whole form
    pub fn set_value(&mut self, field_id: EntityId, value: Value) -> RendererResult<()> {
        if !self.fields.iter().any(|f| f.id == field_id) {
            return Err(RendererError::UnknownField(field_id));
        }
        self.values.insert(field_id, value);
        self.revalidate();
        Ok(())
    }

    /// Validate every field against the current values
    pub fn revalidate(&mut self) -> bool {
        self.errors = self.validator.validate_all(&self.fields, &self.values);
        self.is_valid()
    }

    /// Validate and either accept the values or report the failures
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.revalidate() {
            Logger::info(
                "FORM_SUBMITTED",
                &[("fields", self.fields.len().to_string().as_str())],
            );
            return SubmitOutcome::Accepted(self.values.clone());
        }

        let failures: BTreeMap<EntityId, String> = self
            .errors
            .iter()
            .filter_map(|(id, e)| e.clone().map(|e| (*id, e)))
            .collect();
        Logger::warn(
            "FORM_SUBMIT_REJECTED",
            &[("invalid_fields", failures.len().to_string().as_str())],
        );
        SubmitOutcome::Rejected(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, RuleType, ValidationRule, FIELD_REQUIRED};
    use crate::storage::{FormRecord, MemoryFormStore};
    use serde_json::json;

    fn form() -> Vec<Field> {
        vec![
            Field::new(1, "Name", FieldType::Text).required(),
            Field::new(2, "Age", FieldType::Number)
                .with_rule(ValidationRule::new(3, RuleType::Min, 18, "")),
        ]
    }

    #[tokio::test]
    async fn test_load_initializes_empty_values() {
        let store = MemoryFormStore::with_forms(vec![FormRecord::new(9, form())]);
        let renderer = RendererController::load(&store).await.unwrap();
        assert_eq!(renderer.form_id(), Some(9));
        assert_eq!(renderer.values()[&1], json!(""));
        assert_eq!(renderer.values()[&2], json!(""));
        assert!(renderer.errors().is_empty());
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let renderer = RendererController::load(&MemoryFormStore::new()).await.unwrap();
        assert_eq!(renderer.form_id(), None);
        assert!(renderer.fields().is_empty());
    }

    #[test]
    fn test_any_change_revalidates_all_fields() {
        let mut renderer = RendererController::from_fields(Some(1), form());
        renderer.set_value(2, json!(10)).unwrap();

        assert_eq!(renderer.error_for(1), Some(FIELD_REQUIRED));
        assert_eq!(renderer.error_for(2), Some("Minimum value is 18."));

        renderer.set_value(1, json!("Ada")).unwrap();
        assert_eq!(renderer.error_for(1), None);
        assert_eq!(renderer.error_for(2), Some("Minimum value is 18."));
    }

    #[test]
    fn test_unknown_field() {
        let mut renderer = RendererController::from_fields(Some(1), form());
        assert!(matches!(
            renderer.set_value(99, json!("x")),
            Err(RendererError::UnknownField(99))
        ));
    }

    #[test]
    fn test_submit() {
        let mut renderer = RendererController::from_fields(Some(1), form());
        match renderer.submit() {
            SubmitOutcome::Rejected(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[&1], FIELD_REQUIRED);
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        renderer.set_value(1, json!("Ada")).unwrap();
        renderer.set_value(2, json!(36)).unwrap();
        match renderer.submit() {
            SubmitOutcome::Accepted(values) => assert_eq!(values[&2], json!(36)),
            other => panic!("expected acceptance, got {:?}", other),
        }
    }
}
