//! Bounded in-memory hot tier with eviction spillover
//!
//! The hot tier is a size-bounded, write-age-expiring concurrent map. Every
//! entry that leaves it (capacity eviction, expiry, or explicit
//! invalidation) is handed to a caller-supplied sink exactly once, so the
//! coordinator can persist departures to the disk tier.
//!
//! Backed by moka's synchronous cache: W-TinyLFU admission with
//! frequency-aware eviction and lock-free concurrent reads.

use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::sync::Cache;

use crate::cache::config::HotTierConfig;

/// Why an entry departed the hot tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionCause {
    /// Displaced to keep the tier within its entry bound.
    Capacity,
    /// Exceeded the write-age expiry.
    Expired,
    /// Removed by an explicit invalidation.
    Invalidated,
}

/// Size- and age-bounded in-memory tier
pub struct HotTier<K, V> {
    cache: Cache<K, V>,
}

impl<K, V> HotTier<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a hot tier that forwards every departed entry to `sink`.
    ///
    /// The sink runs on whichever thread performs cache maintenance. A
    /// panicking sink is contained here; it never unwinds into cache
    /// internals or the triggering writer.
    pub fn new<S>(config: HotTierConfig, sink: S) -> Self
    where
        S: Fn(&K, V, EvictionCause) + Send + Sync + 'static,
    {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .eviction_listener(move |key: Arc<K>, value: V, cause: RemovalCause| {
                let cause = match cause {
                    RemovalCause::Size => EvictionCause::Capacity,
                    RemovalCause::Expired => EvictionCause::Expired,
                    RemovalCause::Explicit => EvictionCause::Invalidated,
                    // A replaced value was superseded in place; the key never
                    // left the tier.
                    RemovalCause::Replaced => return,
                };
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| sink(key.as_ref(), value, cause)));
                if outcome.is_err() {
                    log::warn!("eviction sink panicked; departed entry dropped");
                }
            })
            .build();

        Self { cache }
    }

    /// Look up a live entry. Expired entries are not returned.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key)
    }

    /// Insert or replace an entry, resetting its write age.
    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value);
    }

    /// Explicitly remove an entry; the sink observes the departure.
    pub fn invalidate(&self, key: &K) {
        self.cache.invalidate(key);
    }

    /// Drain pending maintenance: apply deferred evictions and expirations
    /// and deliver their sink notifications before returning.
    pub fn flush(&self) {
        self.cache.run_pending_tasks();
    }

    /// Number of resident entries as of the last maintenance pass.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl<K, V> std::fmt::Debug for HotTier<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotTier").finish_non_exhaustive()
    }
}
