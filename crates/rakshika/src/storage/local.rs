//! Key-value storage in a single JSON file.
//!
//! Behaves like browser local storage: string values under string keys,
//! each `set_item` rewriting the whole file. The file is re-read on every
//! access so separate processes see each other's writes (last write wins).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};

/// A JSON file of string keys and string values.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStorage {
    /// Use the file at `path`, which need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::internal("local storage lock poisoned"))?;
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    /// Remove `key`; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::internal("local storage lock poisoned"))?;
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = items.len(), "Local storage written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::new(dir.path().join("nested").join("local-storage.json"))
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage_in(&dir);
        assert_eq!(storage.get_item("anything").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage_in(&dir);
        storage.set_item("emergencyContacts", "[]").unwrap();
        assert_eq!(
            storage.get_item("emergencyContacts").unwrap(),
            Some("[]".to_string())
        );
        assert!(storage.path().exists());
    }

    #[test]
    fn test_set_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage_in(&dir);
        storage.set_item("k", "one").unwrap();
        storage.set_item("k", "two").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("two".to_string()));
    }

    #[test]
    fn test_other_keys_preserved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage_in(&dir);
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_remove_item() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage_in(&dir);
        storage.set_item("a", "1").unwrap();
        storage.remove_item("a").unwrap();
        storage.remove_item("never-set").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }

    #[test]
    fn test_second_instance_sees_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = storage_in(&dir);
        let second = storage_in(&dir);
        first.set_item("shared", "yes").unwrap();
        assert_eq!(second.get_item("shared").unwrap(), Some("yes".to_string()));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("local-storage.json");
        std::fs::write(&path, "{not json").unwrap();
        let storage = LocalStorage::new(path);
        assert!(matches!(storage.get_item("k"), Err(Error::Json(_))));
    }
}
