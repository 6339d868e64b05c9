//! Simple public API for the Permafrost tier cache
//!
//! This provides a user-friendly facade over the tier coordinator: a cheaply
//! cloneable handle with `get`/`put`/`close` and a fluent builder carrying
//! the configuration surface.
//!
//! Users specify both key and value types `Permafrost<K, V>` for full type
//! safety down to the on-disk encoding.

use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::config::CacheConfig;
use crate::cache::coordinator::TierCoordinator;
use crate::cache::repository::{MemoryRepository, Repository};
use crate::cache::tier::cold::DiskTier;
use crate::cache::types::CacheError;

/// Tiered read-through cache handle
///
/// Lookups resolve hot tier → repository → disk tier; the first tier with a
/// value wins and the value is promoted into the hot tier. Entries evicted
/// from the hot tier spill to the disk tier, so lookups keep answering
/// through repository outages.
pub struct Permafrost<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    // Arc-wrapped coordinator: clones share the tiers.
    coordinator: Arc<TierCoordinator<K, V>>,
}

impl<K, V> Clone for Permafrost<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<K, V> Permafrost<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a new cache builder with fluent configuration.
    pub fn builder() -> PermafrostBuilder<K, V> {
        PermafrostBuilder::new()
    }

    /// Look up a value across the tiers.
    ///
    /// Returns `Ok(None)` when no tier holds the key, including when the
    /// repository is down and the disk tier has no copy. Repository and disk
    /// failures never surface here; only use-after-close does.
    pub fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        self.coordinator.get(key)
    }

    /// Insert into the hot tier. The write does not propagate to the
    /// repository; the disk tier receives the entry only if the hot tier
    /// later evicts it.
    pub fn put(&self, key: K, value: V) -> Result<(), CacheError> {
        self.coordinator.put(key, value)
    }

    /// Drain pending hot tier maintenance, delivering deferred eviction
    /// spillover to the disk tier before returning.
    pub fn flush(&self) {
        self.coordinator.flush();
    }

    /// Direct handle to the disk tier for batch loads, batch saves, and
    /// explicit cleanup.
    pub fn disk_tier(&self) -> &DiskTier {
        self.coordinator.disk_tier()
    }

    /// Close the cache: flush the hot tier, close the repository if this
    /// cache created it, close the disk tier. Idempotent; subsequent `get`
    /// and `put` calls report the cache as closed.
    pub fn close(&self) -> Result<(), CacheError> {
        self.coordinator.close()
    }

    /// Whether `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.coordinator.is_closed()
    }
}

impl<K, V> std::fmt::Debug for Permafrost<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permafrost")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

/// Fluent builder for [`Permafrost`] configuration
pub struct PermafrostBuilder<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    config: CacheConfig,
    repository: Option<Arc<dyn Repository<K, V>>>,
}

impl<K, V> PermafrostBuilder<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            repository: None,
        }
    }

    /// Set the disk tier directory (default `./tier_cache_db`). Created,
    /// with parents, if missing.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.disk_tier.path = path.into();
        self
    }

    /// Set the hot tier entry bound (default 1000).
    pub fn max_cache_size(mut self, size: u64) -> Self {
        self.config.hot_tier.max_entries = size;
        self
    }

    /// Set the hot tier write-age expiry (default 15 minutes).
    pub fn hot_tier_ttl(mut self, ttl: Duration) -> Self {
        self.config.hot_tier.ttl = ttl;
        self
    }

    /// Set the retention window in days (default 7). Reserved: accepted for
    /// API stability but not enforced; cleanup wipes the whole store.
    pub fn retention_days(mut self, days: u64) -> Self {
        self.config.disk_tier.retention_days = days;
        self
    }

    /// Set the period of the disk tier's full-wipe cleanup worker. Zero
    /// (the default) disables periodic cleanup.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.disk_tier.cleanup_interval = interval;
        self
    }

    /// Supply the authoritative repository. The cache will not close a
    /// caller-supplied repository; absent one, an in-memory repository is
    /// created and owned by the cache.
    pub fn repository(mut self, repository: Arc<dyn Repository<K, V>>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the cache: open the disk tier (spawning its cleanup worker when
    /// configured), wire the repository, and start the coordinator.
    pub fn build(self) -> Result<Permafrost<K, V>, CacheError> {
        let disk = DiskTier::open(self.config.disk_tier)?;

        let (repository, owns_repository) = match self.repository {
            Some(repository) => (repository, false),
            None => (
                Arc::new(MemoryRepository::new()) as Arc<dyn Repository<K, V>>,
                true,
            ),
        };

        let coordinator =
            TierCoordinator::new(disk, repository, owns_repository, self.config.hot_tier);

        Ok(Permafrost {
            coordinator: Arc::new(coordinator),
        })
    }
}

impl<K, V> Default for PermafrostBuilder<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
