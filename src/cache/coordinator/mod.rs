//! Tier coordination: lookup fallback, promotion, and eviction spillover
//!
//! The coordinator owns the hot and disk tiers and holds a shared handle to
//! the repository. Lookups walk Hot → Repository → Disk; the first tier
//! with a value wins and the value is promoted into the hot tier before it
//! is returned. Repository and disk failures on the lookup path are
//! swallowed: a lookup that would otherwise fail must fall through to the
//! next tier so the cache stays available through outages.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::config::HotTierConfig;
use crate::cache::repository::Repository;
use crate::cache::tier::cold::DiskTier;
use crate::cache::tier::hot::HotTier;
use crate::cache::types::CacheError;

/// Read-through coordinator across the three tiers
pub struct TierCoordinator<K, V> {
    hot: HotTier<K, V>,
    repository: Arc<dyn Repository<K, V>>,
    disk: Arc<DiskTier>,
    owns_repository: bool,
    closed: AtomicBool,
}

impl<K, V> TierCoordinator<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Build the coordinator around an open disk tier and a repository.
    ///
    /// The disk tier becomes exclusively owned here; the repository is shared
    /// and only closed by [`TierCoordinator::close`] when `owns_repository`
    /// is set (the builder sets it for repositories it created itself).
    ///
    /// Every entry departing the hot tier (capacity, expiry, or explicit
    /// invalidation) is offered to the disk tier. A failing spill is logged
    /// and dropped so eviction can never take down a writer.
    pub fn new(
        disk: DiskTier,
        repository: Arc<dyn Repository<K, V>>,
        owns_repository: bool,
        hot_config: HotTierConfig,
    ) -> Self {
        let disk = Arc::new(disk);

        let spill_target = Arc::clone(&disk);
        let hot = HotTier::new(hot_config, move |key: &K, value: V, cause| {
            if let Err(err) = spill_target.save(key, &value) {
                log::warn!("failed to spill {:?} entry to disk tier: {}", cause, err);
            }
        });

        Self {
            hot,
            repository,
            disk,
            owns_repository,
            closed: AtomicBool::new(false),
        }
    }

    /// Resolve a key across the tiers: hot tier, then repository, then disk.
    ///
    /// Repository and disk errors are logged and treated as misses. A value
    /// recovered from a deeper tier is inserted into the hot tier first, so
    /// a repeat lookup inside an outage window is a hot hit.
    pub fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        self.ensure_open()?;

        if let Some(value) = self.hot.get(key) {
            return Ok(Some(value));
        }

        match self.repository.find(key) {
            Ok(Some(value)) => {
                self.hot.insert(key.clone(), value.clone());
                return Ok(Some(value));
            }
            Ok(None) => {}
            Err(err) => {
                log::debug!("repository lookup failed, falling back to disk tier: {}", err);
            }
        }

        match self.disk.load(key) {
            Ok(Some(value)) => {
                self.hot.insert(key.clone(), value.clone());
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                log::debug!("disk tier lookup failed: {}", err);
                Ok(None)
            }
        }
    }

    /// Insert into the hot tier only. The disk tier sees the entry if and
    /// when the hot tier evicts it; the repository is never written here.
    pub fn put(&self, key: K, value: V) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.hot.insert(key, value);
        Ok(())
    }

    /// Drain pending hot tier maintenance, delivering any deferred eviction
    /// spillover to the disk tier before returning.
    pub fn flush(&self) {
        self.hot.flush();
    }

    /// Direct handle to the disk tier for batch and cleanup operations.
    pub fn disk_tier(&self) -> &DiskTier {
        &self.disk
    }

    /// Release the tiers: flush the hot tier, close the repository if owned,
    /// close the disk tier. Idempotent.
    pub fn close(&self) -> Result<(), CacheError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.hot.flush();
        if self.owns_repository {
            if let Err(err) = self.repository.close() {
                log::warn!("error closing repository: {}", err);
            }
        }
        self.disk.close()
    }

    /// Whether `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.is_closed() {
            return Err(CacheError::closed("tier coordinator"));
        }
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for TierCoordinator<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierCoordinator")
            .field("owns_repository", &self.owns_repository)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
