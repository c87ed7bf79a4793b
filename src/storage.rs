//! Persistent client storage port.
//!
//! The stores built on top ([`crate::prefs`], [`crate::token`], [`crate::saved`])
//! treat every [`StorageError`] as "absent" and never surface it.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;

/// Synchronous string key-value storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, one string value per key. The file is re-read on
/// every access so concurrent sessions see each other's writes (last write wins).
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.config/github-repo-search/storage.json`
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("github-repo-search")
                .join("storage.json"),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;
        debug!("Wrote {} storage entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Corrupt contents are overwritten.
        let mut entries = self.load().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load().unwrap_or_default();
        if entries.remove(key).is_some() {
            self.store(&entries)?;
        }
        Ok(())
    }
}
