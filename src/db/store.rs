use anyhow::Result;
use rusqlite::Connection;
#[cfg(test)]
use std::{cell::RefCell, collections::HashMap};

use crate::db::repository::MetaRepo;

/// Small string key-value store; the location cache is written through it.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl KeyValueStore for Connection {
    fn get(&self, key: &str) -> Result<Option<String>> {
        MetaRepo::get(self, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        MetaRepo::set(self, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        MetaRepo::delete(self, key)
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
