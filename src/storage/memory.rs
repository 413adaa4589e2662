use std::{cell::RefCell, collections::HashMap};

use crate::storage::{Storage, StorageError};

/// Keeps values in memory for the lifetime of the value
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    writes: RefCell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `set` has been called
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();

        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(storage.write_count(), 2);
    }
}
