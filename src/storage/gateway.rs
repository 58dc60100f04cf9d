//! # Persistence Gateway
//!
//! Async key-value contract keyed by form id. The stored value is the full
//! ordered field list. Implementations apply operations on one form in the
//! order they are issued.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};
use crate::schema::{EntityId, Field, FormId};

/// One stored form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub form_id: FormId,
    pub fields: Vec<Field>,
    pub updated_at: DateTime<Utc>,
}

impl FormRecord {
    pub fn new(form_id: FormId, fields: Vec<Field>) -> Self {
        Self {
            form_id,
            fields,
            updated_at: Utc::now(),
        }
    }

    /// Append a field
    pub fn append(&mut self, field: Field) {
        self.fields.push(field);
        self.touch();
    }

    /// Remove a field by id. Absent ids are ignored.
    pub fn remove(&mut self, field_id: EntityId) {
        self.fields.retain(|f| f.id != field_id);
        self.touch();
    }

    /// Replace the field with the same id. Absent ids are ignored.
    pub fn replace(&mut self, field: Field) {
        if let Some(slot) = self.fields.iter_mut().find(|f| f.id == field.id) {
            *slot = field;
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Async storage for form definitions
#[async_trait]
pub trait FormStore: Send + Sync + std::fmt::Debug {
    /// Store `fields` as the whole content of the form, creating it if needed
    async fn create_or_replace_form(&self, form_id: FormId, fields: &[Field]) -> StorageResult<()>;

    /// Every stored form, oldest first
    async fn get_all_forms(&self) -> StorageResult<Vec<FormRecord>>;

    /// Append a field; creates the form if absent
    async fn append_field(&self, form_id: FormId, field: &Field) -> StorageResult<()>;

    /// Remove a field; fails if the form does not exist
    async fn remove_field(&self, form_id: FormId, field_id: EntityId) -> StorageResult<()>;

    /// Replace a field by id; fails if the form does not exist
    async fn replace_field(&self, form_id: FormId, field: &Field) -> StorageResult<()>;

    /// End the store's lifecycle. Later calls fail with `Closed`.
    async fn close(&self) -> StorageResult<()>;
}

/// Reject the zero form id
pub(crate) fn require_form_id(form_id: FormId) -> StorageResult<()> {
    if form_id == 0 {
        return Err(StorageError::MissingFormId);
    }
    Ok(())
}

/// Apply an append to an in-memory form list
pub(crate) fn apply_append(forms: &mut Vec<FormRecord>, form_id: FormId, field: &Field) {
    match forms.iter_mut().find(|r| r.form_id == form_id) {
        Some(record) => record.append(field.clone()),
        None => forms.push(FormRecord::new(form_id, vec![field.clone()])),
    }
}

/// Apply a whole-form write to an in-memory form list
pub(crate) fn apply_put(forms: &mut Vec<FormRecord>, form_id: FormId, fields: &[Field]) {
    match forms.iter_mut().find(|r| r.form_id == form_id) {
        Some(record) => {
            record.fields = fields.to_vec();
            record.touch();
        }
        None => forms.push(FormRecord::new(form_id, fields.to_vec())),
    }
}

/// Look up a form for a read-modify-write
pub(crate) fn find_form(
    forms: &mut [FormRecord],
    form_id: FormId,
) -> StorageResult<&mut FormRecord> {
    forms
        .iter_mut()
        .find(|r| r.form_id == form_id)
        .ok_or(StorageError::FormNotFound(form_id))
}
