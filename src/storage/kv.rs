use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::errors::PayResult;

/// Injected key-value persistence capability. The session manager and the
/// ledger only ever talk to storage through this trait, so tests can swap
/// in an in-memory fake.
pub trait KvStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> PayResult<()>;
    fn remove(&self, key: &str) -> PayResult<()>;
}

/// In-memory store. Serves as the ephemeral tier (cleared when the process
/// exits, like session storage) and as the test fake for the durable tier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PayResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PayResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}
