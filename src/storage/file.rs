//! # File-Backed Form Store
//!
//! All forms live in one checksummed JSON file. Each operation is a
//! read-modify-write under a FIFO lock; writes go to a sibling temp file
//! that is then renamed over the store file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::checksum::{frame, unframe};
use super::errors::{StorageError, StorageResult};
use super::gateway::{apply_append, apply_put, find_form, require_form_id, FormRecord, FormStore};
use crate::observability::Logger;
use crate::schema::{EntityId, Field, FormId};

/// JSON file form store
#[derive(Debug)]
pub struct FileFormStore {
    path: PathBuf,
    lock: Mutex<()>,
    closed: AtomicBool,
}

impl FileFormStore {
    /// Open the store at `path`, creating the file and its parent
    /// directories if absent. An existing file must pass its checksum.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self {
            path,
            lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        };

        if fs::try_exists(&store.path).await? {
            let forms = store.load().await?;
            Logger::info(
                "FORM_STORE_OPENED",
                &[
                    ("forms", forms.len().to_string().as_str()),
                    ("path", store.path.display().to_string().as_str()),
                ],
            );
        } else {
            if let Some(parent) = store.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            store.save(&[]).await?;
            Logger::info(
                "FORM_STORE_CREATED",
                &[("path", store.path.display().to_string().as_str())],
            );
        }

        Ok(store)
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    async fn load(&self) -> StorageResult<Vec<FormRecord>> {
        let data = fs::read(&self.path).await?;
        let payload = unframe(&data)?;
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(payload)?)
    }

    async fn save(&self, forms: &[FormRecord]) -> StorageResult<()> {
        let payload = serde_json::to_vec_pretty(forms)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, frame(&payload)).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run one read-modify-write cycle under the store lock
    async fn update<F>(&self, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Vec<FormRecord>) -> StorageResult<()> + Send,
    {
        self.ensure_open()?;
        let _guard = self.lock.lock().await;
        let mut forms = self.load().await?;
        apply(&mut forms)?;
        self.save(&forms).await
    }
}

#[async_trait]
impl FormStore for FileFormStore {
    async fn create_or_replace_form(&self, form_id: FormId, fields: &[Field]) -> StorageResult<()> {
        require_form_id(form_id)?;
        self.update(|forms| {
            apply_put(forms, form_id, fields);
            Ok(())
        })
        .await
    }

    async fn get_all_forms(&self) -> StorageResult<Vec<FormRecord>> {
        self.ensure_open()?;
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn append_field(&self, form_id: FormId, field: &Field) -> StorageResult<()> {
        require_form_id(form_id)?;
        self.update(|forms| {
            apply_append(forms, form_id, field);
            Ok(())
        })
        .await
    }

    async fn remove_field(&self, form_id: FormId, field_id: EntityId) -> StorageResult<()> {
        self.update(|forms| {
            find_form(forms, form_id)?.remove(field_id);
            Ok(())
        })
        .await
    }

    async fn replace_field(&self, form_id: FormId, field: &Field) -> StorageResult<()> {
        self.update(|forms| {
            find_form(forms, form_id)?.replace(field.clone());
            Ok(())
        })
        .await
    }

    async fn close(&self) -> StorageResult<()> {
        // Wait for an in-flight write to land before refusing new ones.
        let _guard = self.lock.lock().await;
        self.closed.store(true, Ordering::Release);
        Logger::info(
            "FORM_STORE_CLOSED",
            &[("path", self.path.display().to_string().as_str())],
        );
        Ok(())
    }
}
