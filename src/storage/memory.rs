use super::{LocalStore, validate_key};
use crate::core::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Session-scoped store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.entries
            .write()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries.write()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("mechanics").unwrap(), None);

        store.set("mechanics", "[]").unwrap();
        assert_eq!(store.get("mechanics").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.len(), 1);

        store.remove("mechanics").unwrap();
        store.remove("mechanics").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_writer_wins() {
        let store = MemoryStore::new();
        store.set("vehicles", "[1]").unwrap();
        store.set("vehicles", "[2]").unwrap();
        assert_eq!(store.get("vehicles").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn test_len_survives_a_poisoned_lock() {
        let store = MemoryStore::new();
        store.set("invoices", "[]").unwrap();
        store.set("vehicles", "[]").unwrap();

        let poisoned: std::thread::Result<()> = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _entries = store.entries.write().unwrap();
                    panic!("writer died");
                })
                .join()
        });
        assert!(poisoned.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }
}
