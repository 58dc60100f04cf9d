//! Builder controller
//!
//! Owns the working copy of one form's field list. Structural edits are
//! applied by replacement and autosaved per field after a debounce window.
//! Adding and deleting fields go to storage immediately. Saving validates
//! the whole form first.
//!
//! The in-memory list is the source of truth for the session: a failed
//! persist is logged and returned, never rolled back.

use std::sync::Arc;
use std::time::Duration;

use crate::config::FormConfig;
use crate::debounce::Debouncer;
use crate::observability::Logger;
use crate::schema::{
    can_save, EntityId, Field, FormId, IdGenerator, SelectOption, StructuralValidator,
    ValidationRule,
};
use crate::storage::FormStore;

use super::edits::{FieldEdit, RuleEdit};
use super::errors::{BuilderError, BuilderResult};

/// Result of a save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save
    Empty,
    /// Structural errors on the listed fields; nothing was written
    Blocked { invalid_fields: Vec<EntityId> },
    /// The whole form was written
    Saved { field_count: usize },
}

/// Builder-side controller for a single form
#[derive(Debug)]
pub struct BuilderController {
    form_id: FormId,
    fields: Vec<Field>,
    store: Arc<dyn FormStore>,
    ids: IdGenerator,
    validator: StructuralValidator,
    autosave: Debouncer<EntityId>,
}

impl BuilderController {
    /// Start a new, empty form
    pub fn new(store: Arc<dyn FormStore>, config: &FormConfig) -> Self {
        Self::with_ids(store, config.debounce(), IdGenerator::new())
    }

    /// Start a new, empty form with an explicit id source
    pub fn with_ids(store: Arc<dyn FormStore>, debounce: Duration, mut ids: IdGenerator) -> Self {
        let form_id = ids.next_id();
        Self {
            form_id,
            fields: Vec::new(),
            store,
            ids,
            validator: StructuralValidator::new(),
            autosave: Debouncer::new(debounce),
        }
    }

    /// Resume the first stored form, or start a new one if storage is empty
    pub async fn load(store: Arc<dyn FormStore>, config: &FormConfig) -> BuilderResult<Self> {
        let forms = store.get_all_forms().await?;
        let mut builder = Self::new(Arc::clone(&store), config);

        if let Some(record) = forms.into_iter().next() {
            builder.ids.reserve(record.form_id);
            builder.ids.reserve_fields(&record.fields);
            builder.form_id = record.form_id;
            builder.fields = record.fields;
            Logger::info(
                "FORM_LOADED",
                &[
                    ("fields", builder.fields.len().to_string().as_str()),
                    ("form_id", builder.form_id.to_string().as_str()),
                ],
            );
        }

        Ok(builder)
    }

    pub fn form_id(&self) -> FormId {
        self.form_id
    }

    /// Current working copy
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, field_id: EntityId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Autosaves not yet written
    pub fn pending_autosaves(&self) -> usize {
        self.autosave.pending()
    }

    /// Append a blank field. Storage is written first; the working copy
    /// only grows once the write succeeded.
    pub async fn add_field(&mut self) -> BuilderResult<EntityId> {
        let field = Field::blank(self.ids.next_id());

        if let Err(e) = self.store.append_field(self.form_id, &field).await {
            self.log_persist_failure("append_field", field.id, &e.to_string());
            return Err(e.into());
        }

        let field_id = field.id;
        self.fields.push(field);
        Logger::info(
            "FIELD_ADDED",
            &[
                ("field_id", field_id.to_string().as_str()),
                ("form_id", self.form_id.to_string().as_str()),
            ],
        );
        Ok(field_id)
    }

    /// Remove a field from storage, then from the working copy. A pending
    /// autosave for the field is dropped.
    pub async fn delete_field(&mut self, field_id: EntityId) -> BuilderResult<()> {
        self.index_of(field_id)?;

        if let Err(e) = self.store.remove_field(self.form_id, field_id).await {
            self.log_persist_failure("remove_field", field_id, &e.to_string());
            return Err(e.into());
        }

        self.autosave.cancel(&field_id);
        self.fields.retain(|f| f.id != field_id);
        Logger::info(
            "FIELD_DELETED",
            &[
                ("field_id", field_id.to_string().as_str()),
                ("form_id", self.form_id.to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// Change one of the field's own properties
    pub fn edit_field(&mut self, field_id: EntityId, edit: FieldEdit) -> BuilderResult<()> {
        Logger::trace(
            "FIELD_EDITED",
            &[("field_id", field_id.to_string().as_str()), ("property", edit.name())],
        );
        self.replace_with(field_id, |field| Ok(edit.apply(field)))
    }

    /// Append a blank option to a field
    pub fn add_option(&mut self, field_id: EntityId) -> BuilderResult<EntityId> {
        let option_id = self.ids.next_id();
        self.replace_with(field_id, |field| {
            let mut next = field.clone();
            next.options.push(SelectOption::blank(option_id));
            Ok(next)
        })?;
        Ok(option_id)
    }

    /// Relabel an option
    pub fn edit_option(
        &mut self,
        field_id: EntityId,
        option_id: EntityId,
        label: impl Into<String>,
    ) -> BuilderResult<()> {
        let label = label.into();
        self.replace_with(field_id, |field| {
            let mut next = field.clone();
            let option = next
                .options
                .iter_mut()
                .find(|o| o.id == option_id)
                .ok_or(BuilderError::OptionNotFound { field_id, option_id })?;
            option.label = label;
            Ok(next)
        })
    }

    pub fn delete_option(&mut self, field_id: EntityId, option_id: EntityId) -> BuilderResult<()> {
        self.replace_with(field_id, |field| {
            if field.option(option_id).is_none() {
                return Err(BuilderError::OptionNotFound { field_id, option_id });
            }
            let mut next = field.clone();
            next.options.retain(|o| o.id != option_id);
            Ok(next)
        })
    }

    /// Append a blank `equal` rule to a field
    pub fn add_validation(&mut self, field_id: EntityId) -> BuilderResult<EntityId> {
        let rule_id = self.ids.next_id();
        self.replace_with(field_id, |field| {
            let mut next = field.clone();
            next.validations.push(ValidationRule::blank(rule_id));
            Ok(next)
        })?;
        Ok(rule_id)
    }

    pub fn edit_validation(
        &mut self,
        field_id: EntityId,
        rule_id: EntityId,
        edit: RuleEdit,
    ) -> BuilderResult<()> {
        self.replace_with(field_id, |field| {
            let mut next = field.clone();
            let rule = next
                .validations
                .iter_mut()
                .find(|r| r.id == rule_id)
                .ok_or(BuilderError::RuleNotFound { field_id, rule_id })?;
            *rule = edit.apply(rule);
            Ok(next)
        })
    }

    pub fn delete_validation(
        &mut self,
        field_id: EntityId,
        rule_id: EntityId,
    ) -> BuilderResult<()> {
        self.replace_with(field_id, |field| {
            if field.rule(rule_id).is_none() {
                return Err(BuilderError::RuleNotFound { field_id, rule_id });
            }
            let mut next = field.clone();
            next.validations.retain(|r| r.id != rule_id);
            Ok(next)
        })
    }

    /// Validate the whole form and write it if no field has a field-level
    /// error. The working copy is replaced by the annotated fields either way.
    pub async fn save(&mut self) -> BuilderResult<SaveOutcome> {
        if self.fields.is_empty() {
            return Ok(SaveOutcome::Empty);
        }

        self.fields = self.validator.validate(&self.fields);

        if !can_save(&self.fields) {
            let invalid_fields: Vec<EntityId> =
                self.fields.iter().filter(|f| f.has_error()).map(|f| f.id).collect();
            Logger::warn(
                "FORM_SAVE_BLOCKED",
                &[
                    ("form_id", self.form_id.to_string().as_str()),
                    ("invalid_fields", invalid_fields.len().to_string().as_str()),
                ],
            );
            return Ok(SaveOutcome::Blocked { invalid_fields });
        }

        let persisted: Vec<Field> = self.fields.iter().map(Field::without_errors).collect();
        if let Err(e) = self.store.create_or_replace_form(self.form_id, &persisted).await {
            Logger::error(
                "PERSIST_FAILED",
                &[
                    ("form_id", self.form_id.to_string().as_str()),
                    ("operation", "create_or_replace_form"),
                    ("reason", e.to_string().as_str()),
                ],
            );
            return Err(e.into());
        }

        Logger::info(
            "FORM_SAVED",
            &[
                ("fields", persisted.len().to_string().as_str()),
                ("form_id", self.form_id.to_string().as_str()),
            ],
        );
        Ok(SaveOutcome::Saved {
            field_count: persisted.len(),
        })
    }

    /// Wait until every pending autosave has been written
    pub async fn flush(&self) {
        self.autosave.drain().await;
    }

    fn index_of(&self, field_id: EntityId) -> BuilderResult<usize> {
        self.fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or(BuilderError::FieldNotFound(field_id))
    }

    /// Replace a field with the result of `edit` and schedule its autosave
    fn replace_with<F>(&mut self, field_id: EntityId, edit: F) -> BuilderResult<()>
    where
        F: FnOnce(&Field) -> BuilderResult<Field>,
    {
        let index = self.index_of(field_id)?;
        let next = edit(&self.fields[index])?;
        self.schedule_autosave(&next);
        self.fields[index] = next;
        Ok(())
    }

    /// Fields failing the field-level structural check are not autosaved.
    fn schedule_autosave(&self, field: &Field) {
        if !self.validator.is_field_valid(field) {
            Logger::trace(
                "AUTOSAVE_SKIPPED",
                &[("field_id", field.id.to_string().as_str())],
            );
            return;
        }

        let store = Arc::clone(&self.store);
        let form_id = self.form_id;
        let field = field.without_errors();

        self.autosave.schedule(field.id, async move {
            match store.replace_field(form_id, &field).await {
                Ok(()) => Logger::trace(
                    "FIELD_PERSISTED",
                    &[("field_id", field.id.to_string().as_str())],
                ),
                Err(e) => Logger::error(
                    "PERSIST_FAILED",
                    &[
                        ("field_id", field.id.to_string().as_str()),
                        ("form_id", form_id.to_string().as_str()),
                        ("operation", "replace_field"),
                        ("reason", e.to_string().as_str()),
                    ],
                ),
            }
        });
    }

    fn log_persist_failure(&self, operation: &str, field_id: EntityId, reason: &str) {
        Logger::error(
            "PERSIST_FAILED",
            &[
                ("field_id", field_id.to_string().as_str()),
                ("form_id", self.form_id.to_string().as_str()),
                ("operation", operation),
                ("reason", reason),
            ],
        );
    }
}
