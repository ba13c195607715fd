pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::{debug, warn};

/// A thread-safe key-value store that can hold multiple collections.
pub struct KeyValueStore {
    collections: RwLock<HashMap<(String, bool), Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Keyspace>,
}

impl KeyValueStore {
    /// Opens the store under `data_dir`. Without a usable keyspace only
    /// in-memory collections are available.
    pub fn open(data_dir: &Path) -> Self {
        let store_dir = data_dir.join("store");
        let keyspace = match fjall::Config::new(&store_dir).open() {
            Ok(keyspace) => Some(keyspace),
            Err(e) => {
                warn!("Could not open store at {}: {e}", store_dir.display());
                None
            }
        };

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    /// Like [`Store::get_collection`] with `persist = true`, but falls back to
    /// an in-memory collection when the disk is unavailable.
    pub fn durable_or_memory(&self, name: &str) -> Arc<dyn KeyValueCollection> {
        self.get_collection(name, true)
            .or_else(|| {
                debug!("Using in-memory collection for {}", name);
                self.get_collection(name, false)
            })
            .unwrap_or_else(|| Arc::new(MemoryCollection::new()))
    }

    fn create_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>> {
        if !persist {
            return Some(Arc::new(MemoryCollection::new()));
        }

        let keyspace = self.keyspace.as_ref()?;
        match keyspace.open_partition(name, PartitionCreateOptions::default()) {
            Ok(partition) => Some(Arc::new(DiskCollection::new(keyspace.clone(), partition))),
            Err(e) => {
                warn!("Could not open partition {}: {e}", name);
                None
            }
        }
    }
}

impl Store for KeyValueStore {
    fn get_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>> {
        let key = (name.to_string(), persist);
        if let Some(collection) = self
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Some(Arc::clone(collection));
        }

        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(collection) = collections.get(&key) {
            return Some(Arc::clone(collection));
        }

        let collection = self.create_collection(name, persist)?;
        collections.insert(key, Arc::clone(&collection));
        Some(collection)
    }
}
