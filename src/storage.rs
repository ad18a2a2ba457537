//! Key-value backends for persisted world data.
//!
//! The world only ever hands these opaque blobs; framing and encoding live in
//! `save`.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PersistenceError;

const BLOB_EXTENSION: &str = "bin";

pub trait Storage: Send {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError>;
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;
    fn delete(&self, key: &str) -> Result<(), PersistenceError>;
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

/// In-memory backend. Clones share the same map, so a test can keep a handle
/// and inspect what the world wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<FxHashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail, like a full quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }

    /// Overwrites a blob directly, bypassing failure injection.
    pub fn put_raw(&self, key: &str, blob: Vec<u8>) {
        self.blobs.lock().insert(key.to_string(), blob);
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "storage quota exceeded").into());
        }
        self.blobs.lock().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.blobs.lock().keys().cloned().collect())
    }
}

/// One file per key inside a save directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FileStorage {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::Corrupt(format!("invalid storage key {:?}", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        // Write beside the target and rename so readers never see a torn blob.
        let tmp = path.with_extension(format!("{}.tmp", BLOB_EXTENSION));
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(blob)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_is_shared_between_clones() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.save("meta", b"abc").unwrap();
        assert_eq!(handle.load("meta").unwrap(), Some(b"abc".to_vec()));
        handle.delete("meta").unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.load("meta").unwrap(), None);
    }

    #[test]
    fn memory_storage_failure_injection() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(matches!(storage.save("k", b"v"), Err(PersistenceError::Io(_))));
        storage.set_fail_writes(false);
        assert!(storage.save("k", b"v").is_ok());
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("save"));

        assert_eq!(storage.keys().unwrap(), Vec::<String>::new());
        assert_eq!(storage.load("chunk.0.-1").unwrap(), None);

        storage.save("chunk.0.-1", &[1, 2, 3]).unwrap();
        storage.save("meta", &[9]).unwrap();
        storage.save("meta", &[10]).unwrap();
        assert_eq!(storage.load("chunk.0.-1").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(storage.load("meta").unwrap(), Some(vec![10]));
        assert_eq!(storage.keys().unwrap(), vec!["chunk.0.-1", "meta"]);

        storage.delete("meta").unwrap();
        storage.delete("meta").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["chunk.0.-1"]);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.save("../escape", &[0]).is_err());
        assert!(storage.load("a/b").is_err());
    }
}
