use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory collection, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueCollection for MemoryCollection {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Memory HIT for key: {}", key);
        } else {
            debug!("Memory MISS for key: {}", key);
        }
        value
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.inner.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        debug!("Memory PUT for key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.inner.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        debug!("Memory REMOVE for key: {}", key);
        Ok(())
    }
}
