//! File storage abstraction
//!
//! The remote storage API is an external collaborator; the core only depends
//! on this trait. [`crate::api::ApiClient`] is the production implementation,
//! [`MemoryStorage`] backs tests and embedded use.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, StorageError};

/// Remote file storage operations
///
/// All state is remote or in-memory per session; the trait exposes no
/// persisted state of its own.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// List all stored filenames.
    async fn list_files(&self) -> Result<Vec<String>>;

    /// Read a file's full content.
    async fn read_file(&self, filename: &str) -> Result<String>;

    /// Create or overwrite a file.
    async fn write_file(&self, filename: &str, content: &str) -> Result<()>;

    /// Delete a file.
    async fn delete_file(&self, filename: &str) -> Result<()>;
}

/// In-memory storage backend
///
/// Filenames are kept sorted for deterministic listing order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with `(name, content)` pairs.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let map = files
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            files: Mutex::new(map),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // Lock poisoning only happens if a writer panicked; the map itself
        // stays consistent, so recover the guard.
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn read_file(&self, filename: &str) -> Result<String> {
        self.lock()
            .get(filename)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(filename.to_string()).into())
    }

    async fn write_file(&self, filename: &str, content: &str) -> Result<()> {
        self.lock()
            .insert(filename.to_string(), content.to_string());
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<()> {
        match self.lock().remove(filename) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(filename.to_string()).into()),
        }
    }
}
