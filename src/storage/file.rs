use super::{LocalStore, validate_key};
use crate::core::{Result, SyncError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory-backed store: one `<key>.json` file per key.
///
/// Writes go to a temp file in the same directory and are renamed into place,
/// so a crash never leaves a half-written snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            SyncError::Storage(format!(
                "Failed to create store directory '{}': {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Storage(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            SyncError::Storage(format!("Failed to create temp file: {}", e))
        })?;
        temp.write_all(value.as_bytes())
            .map_err(|e| SyncError::Storage(format!("Failed to write '{}': {}", key, e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| SyncError::Storage(format!("Failed to sync '{}': {}", key, e)))?;
        temp.persist(&path).map_err(|e| {
            SyncError::Storage(format!(
                "Failed to rename temp file -> '{}': {}",
                path.display(),
                e.error
            ))
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Storage(format!(
                "Failed to delete '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("invoices", r#"[{"id":1}]"#).unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("invoices").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert!(dir.path().join("invoices.json").exists());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("vehicles", "[1]").unwrap();
        store.set("vehicles", "[1,2]").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.get("vehicles").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        store.remove("mechanics").unwrap();
        assert_eq!(store.get("mechanics").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "[]"),
            Err(SyncError::InvalidKey(_))
        ));
    }
}
