use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use tracing::debug;

/// Collection backed by a fjall partition. Writes are synced before returning.
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Keyspace, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

impl KeyValueCollection for DiskCollection {
    fn get(&self, key: &str) -> Option<String> {
        let res: Result<Option<String>> = (|| {
            let Some(value) = self.partition.get(key)? else {
                debug!("Disk MISS for key: {}", key);
                return Ok(None);
            };
            debug!("Disk HIT for key: {}", key);
            Ok(Some(String::from_utf8(value.to_vec())?))
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.partition.insert(key.as_bytes(), value.as_bytes())?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Disk PUT for key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.partition.remove(key.as_bytes())?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Disk REMOVE for key: {}", key);
        Ok(())
    }
}
