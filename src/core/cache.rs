//! Persistence abstractions and the rate snapshot cache

use crate::core::clock::Clock;
use crate::core::config::CacheConfig;
use crate::core::currency::RateSnapshot;
use anyhow::Result;
use chrono::SubsecRound;
use std::sync::Arc;
use tracing::{debug, warn};

/// A named, synchronous string key-value collection.
pub trait KeyValueCollection: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Hands out collections by name. `persist` selects durable storage.
pub trait Store: Send + Sync {
    fn get_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>>;
}

/// Keeps the most recent [`RateSnapshot`] with a fixed freshness window.
///
/// Expired or unreadable entries are evicted on read and reported as absent.
pub struct RateCache {
    collection: Arc<dyn KeyValueCollection>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl RateCache {
    pub fn new(
        collection: Arc<dyn KeyValueCollection>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collection,
            config,
            clock,
        }
    }

    pub fn expiry(&self) -> chrono::Duration {
        self.config.expiry()
    }

    /// Stamps `snapshot` with the current time and overwrites the stored entry.
    ///
    /// Persistence failures are logged; the stamped snapshot is returned either way.
    pub fn store(&self, mut snapshot: RateSnapshot) -> RateSnapshot {
        // Persisted timestamps carry millisecond precision
        snapshot.fetched_at = self.clock.now().trunc_subsecs(3);

        let written = serde_json::to_string(&snapshot)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.collection.set(&self.config.key, &json));
        match written {
            Ok(()) => debug!("Cache PUT for key: {}", self.config.key),
            Err(e) => warn!("Failed to cache exchange rates: {e}"),
        }

        snapshot
    }

    /// Returns the stored snapshot while it is within the expiry window.
    pub fn load(&self) -> Option<RateSnapshot> {
        let Some(raw) = self.collection.get(&self.config.key) else {
            debug!("Cache MISS for key: {}", self.config.key);
            return None;
        };

        let snapshot: RateSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Discarding unreadable cache entry {}: {e}", self.config.key);
                self.evict();
                return None;
            }
        };

        if !self.is_fresh(&snapshot) {
            debug!("Cache entry expired for key: {}", self.config.key);
            self.evict();
            return None;
        }

        debug!("Cache HIT for key: {}", self.config.key);
        Some(snapshot)
    }

    /// True while `now - fetched_at` is within the expiry window.
    pub fn is_fresh(&self, snapshot: &RateSnapshot) -> bool {
        self.clock.now() - snapshot.fetched_at <= self.expiry()
    }

    fn evict(&self) {
        if let Err(e) = self.collection.remove(&self.config.key) {
            debug!("Failed to evict cache entry {}: {e}", self.config.key);
        }
    }
}
