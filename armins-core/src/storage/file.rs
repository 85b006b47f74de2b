//! Directory-backed key-value store
//!
//! Each key is one `<key>.json` file. Writes go to a temporary sibling first and are
//! renamed into place, so a crash mid-write leaves the previous value intact.

use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Stores each key as a file under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the key files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested/store");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_set_get_remove() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        assert_eq!(store.get("armins-messages").unwrap(), None);

        store.set("armins-messages", "{}").unwrap();
        assert_eq!(store.get("armins-messages").unwrap().as_deref(), Some("{}"));
        assert!(temp.path().join("armins-messages.json").exists());
        assert!(!temp.path().join("armins-messages.json.tmp").exists());

        store.remove("armins-messages").unwrap();
        store.remove("armins-messages").unwrap();
        assert_eq!(store.get("armins-messages").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        FileStore::open(temp.path())
            .unwrap()
            .set("armins-chat-history", "[]")
            .unwrap();

        let reopened = FileStore::open(temp.path()).unwrap();
        assert_eq!(
            reopened.get("armins-chat-history").unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }
}
