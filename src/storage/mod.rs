//! Persistent Local Store: the durable, best-effort mirror of the entity cache.
//!
//! Each collection is stored as one JSON array under its own key. The store is
//! written on every cache mutation and read back only at start-up or when the
//! backend cannot be reached.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::core::{Result, SyncError};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Level, event};

/// Synchronous key/value storage scoped to one client session.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Keys are used as file names by [`FileStore`], so they are restricted to a
/// conservative character set everywhere.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidKey(key.to_string()))
    }
}

/// Reads a collection snapshot.
///
/// Missing keys, unreadable storage and corrupt JSON all yield an empty
/// collection; the latter two are logged.
pub fn load_collection<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            event!(Level::WARN, key, error = %err, "local store read failed");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(err) => {
            event!(Level::WARN, key, error = %err, "discarding malformed local snapshot");
            Vec::new()
        }
    }
}

pub fn save_collection<T: Serialize>(store: &dyn LocalStore, key: &str, items: &[T]) -> Result<()> {
    let serialized = serde_json::to_string(items)?;
    store.set(key, &serialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("serviceRequests").is_ok());
        assert!(validate_key("mechanics-v2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("a/b").is_err());
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryStore::new();
        save_collection(&store, "rows", &[Row { id: 1 }, Row { id: 2 }]).unwrap();
        let rows: Vec<Row> = load_collection(&store, "rows");
        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 2 }]);
    }

    #[test]
    fn test_missing_and_corrupt_snapshots_load_empty() {
        let store = MemoryStore::new();
        assert!(load_collection::<Row>(&store, "rows").is_empty());

        store.set("rows", "{not json").unwrap();
        assert!(load_collection::<Row>(&store, "rows").is_empty());

        store.set("rows", r#"{"id": 1}"#).unwrap();
        assert!(load_collection::<Row>(&store, "rows").is_empty());
    }
}
