use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::to_string_pretty;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::{Storage, StorageError};

/// Current layout version of the storage file
pub const CURRENT_VERSION: u32 = 1;

pub const DEFAULT_BACKUP_LIMIT: usize = 5;

#[derive(Serialize, Deserialize)]
struct StorageFile {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

fn current_version() -> u32 {
    CURRENT_VERSION
}

impl Default for StorageFile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Key-value entries kept in a single JSON file, replaced atomically on every
/// write with rotating backups next to it.
pub struct JsonFileStorage {
    path: PathBuf,
    backup_limit: usize,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            backup_limit: DEFAULT_BACKUP_LIMIT,
        }
    }

    pub fn with_backup_limit(mut self, backup_limit: usize) -> Self {
        self.backup_limit = backup_limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<StorageFile, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StorageFile::default());
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let file: StorageFile =
            serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })?;

        if file.version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(file.version));
        }

        Ok(file)
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir_all(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })
    }

    fn create_backup(&self) -> Result<(), StorageError> {
        if self.backup_limit == 0 {
            return Ok(());
        }

        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(());
        }

        self.create_backup_dir()?;
        let backup_path = self.get_backup_path();
        fs::copy(&self.path, &backup_path).map_err(|e| StorageError::BackupFailed {
            path: backup_path.clone(),
            source: e,
        })?;
        debug!(backup = %backup_path.display(), "backed up storage file");
        Ok(())
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        // Backup names end in a zero-padded timestamp, so name order is age order
        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(self.backup_limit);
        for file_path in &file_entries[..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("store"));
        let micros = jiff::Timestamp::now().as_microsecond();

        self.get_backup_dir().join(format!("{stem}-{micros:020}.json"))
    }
}

impl Storage for JsonFileStorage {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut file = self.read_file()?;
        Ok(file.entries.remove(key))
    }

    #[tracing::instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        let mut file = match self.read_file() {
            Ok(file) => file,
            Err(StorageError::ParseFailed { source, .. }) => {
                // The unreadable file still goes to backups before being replaced
                warn!(error = %source, "replacing corrupt storage file");
                StorageFile::default()
            }
            Err(e) => return Err(e),
        };
        file.version = CURRENT_VERSION;
        file.entries.insert(key.to_string(), value.to_string());

        let json =
            to_string_pretty(&file).map_err(|e| StorageError::SerializeFailed { source: e })?;

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        info!(key, bytes = value.len(), "saved");
        Ok(())
    }
}
