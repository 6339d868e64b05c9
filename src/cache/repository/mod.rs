//! Authoritative repository contract and in-memory implementation
//!
//! The repository is the source of truth the cache fronts. The coordinator
//! only ever calls `find`; any error it raises is treated the same as an
//! absent key and the lookup falls through to the disk tier.
//!
//! [`MemoryRepository`] doubles as the default backing store and as the test
//! double: it can simulate lookup latency and be toggled unavailable to
//! exercise the outage path.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;

use crate::cache::types::CacheError;

/// Authoritative store consumed by the tier coordinator
pub trait Repository<K, V>: Send + Sync {
    /// Look up a key. Any error is treated by the coordinator as "absent,
    /// unavailable" and swallowed.
    fn find(&self, key: &K) -> Result<Option<V>, CacheError>;

    /// Persist a value. The coordinator never calls this; it exists for
    /// callers wiring up their own write path.
    fn save(&self, key: K, value: V) -> Result<(), CacheError>;

    /// Release backing resources, if any.
    fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// In-memory repository with optional simulated latency and outages
pub struct MemoryRepository<K, V> {
    entries: DashMap<K, V>,
    latency: Option<(Duration, Duration)>,
    available: AtomicBool,
}

impl<K, V> MemoryRepository<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty repository with no artificial latency.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            latency: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create a repository whose calls sleep a random duration in
    /// `[min, max]`, approximating a remote database.
    pub fn with_latency(min: Duration, max: Duration) -> Self {
        Self {
            latency: Some((min, max.max(min))),
            ..Self::new()
        }
    }

    /// Toggle availability. While unavailable, `find` fails; the coordinator
    /// then falls through to the disk tier.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Current availability.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the repository holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn simulate_latency(&self) {
        if let Some((min, max)) = self.latency {
            let span = max.saturating_sub(min).as_millis() as u64;
            let jitter = if span == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(rand::thread_rng().gen_range(0..=span))
            };
            thread::sleep(min + jitter);
        }
    }
}

impl<K, V> Default for MemoryRepository<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Repository<K, V> for MemoryRepository<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn find(&self, key: &K) -> Result<Option<V>, CacheError> {
        if !self.is_available() {
            return Err(CacheError::repository("repository is unavailable"));
        }
        self.simulate_latency();
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: K, value: V) -> Result<(), CacheError> {
        self.simulate_latency();
        self.entries.insert(key, value);
        Ok(())
    }

    fn close(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for MemoryRepository<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("entries", &self.entries.len())
            .field("available", &self.available.load(Ordering::Acquire))
            .finish()
    }
}
