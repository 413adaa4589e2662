use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::models::store::{STORE_KEY, TaskStore};

pub mod json;
pub mod memory;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize storage file: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Storage file was created by a newer version of daybook (version {0}). Please upgrade daybook to open this file."
    )]
    FutureVersion(u32),
}

/// String key-value surface the task store is persisted through
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Reads the task store once at session start. Missing or unreadable task
/// data yields an empty store; only environment failures are returned.
pub fn load_store(storage: &impl Storage) -> Result<TaskStore, StorageError> {
    match storage.get(STORE_KEY) {
        Ok(raw) => Ok(TaskStore::deserialize(raw.as_deref())),
        Err(StorageError::ParseFailed { path, source }) => {
            warn!(path = %path.display(), error = %source, "storage file is corrupt, starting from an empty store");
            Ok(TaskStore::default())
        }
        Err(e) => Err(e),
    }
}

pub fn save_store(storage: &impl Storage, store: &TaskStore) -> Result<(), StorageError> {
    storage.set(STORE_KEY, &store.serialize())
}
