//! Durable string key-value storage.
//!
//! Plays the role browser `localStorage` plays for the web admin panel:
//! the token store and the persisted state container both write through
//! a `KeyValueStorage`. The on-disk backend keeps every key in a single
//! JSON object file; the in-memory backend is used by tests and by
//! callers that want nothing to survive the process.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// File name of the JSON document holding all stored keys.
pub const STORAGE_FILE_NAME: &str = "storage.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Minimal `localStorage`-shaped interface.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage backed by one JSON file on disk.
///
/// Every operation re-reads the file so separate CLI invocations observe
/// each other's writes. Writes go to a sibling temp file and are renamed
/// into place. A corrupt file is moved to `storage.json.corrupt`.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) `storage.json` inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(STORAGE_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the unreadable file is moved to before starting over.
    pub fn quarantine_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    /// A file that does not parse is moved aside and reads as empty, so
    /// the next write starts a fresh document.
    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(items) => Ok(items),
            Err(e) => {
                let aside = self.quarantine_path();
                log::warn!(
                    "Storage file {} is corrupt ({}), moving it to {} and starting empty",
                    self.path.display(),
                    e,
                    aside.display()
                );
                fs::rename(&self.path, &aside)?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).unwrap();
            storage.set_item("access_token", "abc123").unwrap();
            storage.set_item("persist:root", "blob").unwrap();
        }
        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item("access_token").unwrap().as_deref(),
            Some("abc123")
        );
        assert_eq!(reopened.get_item("persist:root").unwrap().as_deref(), Some("blob"));
    }

    #[test]
    fn test_file_storage_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(&dir.path().join("nested")).unwrap();
        assert!(storage.get_item("anything").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_accepts_writes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE_NAME), b"{truncated").unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert!(storage.get_item("access_token").unwrap().is_none());
        assert_eq!(
            std::fs::read(storage.quarantine_path()).unwrap(),
            b"{truncated".to_vec()
        );

        storage.set_item("access_token", "abc123").unwrap();
        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item("access_token").unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_corrupt_file_replaced_by_first_write() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE_NAME), b"[1, 2").unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.set_item("persist:root", "blob").unwrap();
        assert_eq!(storage.get_item("persist:root").unwrap().as_deref(), Some("blob"));
        storage.remove_item("persist:root").unwrap();
        assert!(storage.get_item("persist:root").unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "1").unwrap();
        storage.set_item("k", "2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("2"));
    }
}
