//! Minimal durable key-value store behind the timer registry.
//!
//! The registry persists its whole timer map as one blob through this
//! interface, so the core stays storage-agnostic: a file per key in
//! production, an in-memory map in tests.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::data_dir;

/// Durable key-value storage.
///
/// Writes must be atomic per key as far as the backend allows; a reader
/// should never observe a half-written value.
pub trait DurableStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// File-backed store: one `<key>.json` file per key under a directory.
///
/// Writes go through a temp file + rename so a crash mid-write leaves the
/// previous value intact.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Open the store under the default data directory.
    pub fn open_default() -> Result<Self, std::io::Error> {
        Ok(Self::new(data_dir()?))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let write = std::fs::write(&tmp, value).and_then(|()| std::fs::rename(&tmp, &path));
        write.map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory store for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    map: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().to_path_buf());

        assert!(store.get("timers").unwrap().is_none());
        store.set("timers", b"{\"a\":1}").unwrap();
        assert_eq!(store.get("timers").unwrap().unwrap(), b"{\"a\":1}");

        store.delete("timers").unwrap();
        assert!(store.get("timers").unwrap().is_none());
        // Deleting a missing key is not an error.
        store.delete("timers").unwrap();
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.set("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"v");
        store.delete("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
