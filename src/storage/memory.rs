//! # In-Memory Form Store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::{StorageError, StorageResult};
use super::gateway::{apply_append, apply_put, find_form, require_form_id, FormRecord, FormStore};
use crate::schema::{EntityId, Field, FormId};

/// Process-local form store. Operations are serialized through a FIFO lock,
/// so they apply in the order they were issued.
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    forms: Mutex<Vec<FormRecord>>,
    closed: AtomicBool,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_forms(forms: Vec<FormRecord>) -> Self {
        Self {
            forms: Mutex::new(forms),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl FormStore for MemoryFormStore {
    async fn create_or_replace_form(&self, form_id: FormId, fields: &[Field]) -> StorageResult<()> {
        self.ensure_open()?;
        require_form_id(form_id)?;
        let mut forms = self.forms.lock().await;
        apply_put(&mut forms, form_id, fields);
        Ok(())
    }

    async fn get_all_forms(&self) -> StorageResult<Vec<FormRecord>> {
        self.ensure_open()?;
        Ok(self.forms.lock().await.clone())
    }

    async fn append_field(&self, form_id: FormId, field: &Field) -> StorageResult<()> {
        self.ensure_open()?;
        require_form_id(form_id)?;
        let mut forms = self.forms.lock().await;
        apply_append(&mut forms, form_id, field);
        Ok(())
    }

    async fn remove_field(&self, form_id: FormId, field_id: EntityId) -> StorageResult<()> {
        self.ensure_open()?;
        let mut forms = self.forms.lock().await;
        find_form(&mut forms, form_id)?.remove(field_id);
        Ok(())
    }

    async fn replace_field(&self, form_id: FormId, field: &Field) -> StorageResult<()> {
        self.ensure_open()?;
        let mut forms = self.forms.lock().await;
        find_form(&mut forms, form_id)?.replace(field.clone());
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
