//! Key-value storage for the persisted catalog selection
//!
//! The controller remembers the last property type, filter snapshot and sort
//! order through an injected [`Storage`]. Two implementations are provided:
//!
//! - [`MemoryStorage`] - process lifetime only; used in tests and when no state file is configured
//! - [`FileStorage`] - a JSON object of strings in a single file
//!
//! Values are plain strings; the controller decides the encoding of each key.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use snafu::prelude::*;
use tracing::debug;

use crate::error::{CorruptSnafu, FileSnafu, StorageError};

/// String key-value store.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Returns the value for `key`, or None if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON file.
///
/// The whole file is read on every `get` and rewritten on every `set`; the
/// stored selection is a handful of short strings. A missing file is empty.
/// Parent directories are created on first write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::File {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).context(CorruptSnafu { path: &self.path })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context(FileSnafu { path: parent })?;
        }
        let text = serde_json::to_string_pretty(values).context(CorruptSnafu { path: &self.path })?;
        fs::write(&self.path, text).context(FileSnafu { path: &self.path })?;
        debug!(path = ?self.path, keys = values.len(), "saved storage file");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_roundtrip() -> Result<(), StorageError> {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("catalog.sort")?, None);
        storage.set("catalog.sort", "precio-asc")?;
        assert_eq!(storage.get("catalog.sort")?.as_deref(), Some("precio-asc"));
        storage.remove("catalog.sort")?;
        storage.remove("catalog.sort")?;
        assert!(storage.is_empty());
        Ok(())
    }

    #[test]
    fn file_storage_persists_across_instances() -> Result<(), StorageError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("catalog.propertyType")?, None);
        storage.set("catalog.propertyType", "lote")?;
        storage.set("catalog.sort", "area-asc")?;

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("catalog.propertyType")?.as_deref(), Some("lote"));
        reopened.remove("catalog.propertyType")?;
        assert_eq!(storage.get("catalog.propertyType")?, None);
        assert_eq!(storage.get("catalog.sort")?.as_deref(), Some("area-asc"));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").expect("write");
        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("catalog.sort"),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn empty_file_reads_as_empty() -> Result<(), StorageError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "").expect("write");
        assert_eq!(FileStorage::new(&path).get("catalog.sort")?, None);
        Ok(())
    }
}
