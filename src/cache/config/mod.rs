//! Configuration types for the cache tiers
//!
//! Defaults mirror the library's intended deployment: a thousand-entry hot
//! tier with a fifteen-minute write-age expiry in front of a compressed disk
//! store at `./tier_cache_db`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::serde::DEFAULT_POOL_CAPACITY;

/// Default disk tier directory.
pub const DEFAULT_STORE_PATH: &str = "./tier_cache_db";
/// Default hot tier entry bound.
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 1000;
/// Default hot tier write-age expiry.
pub const DEFAULT_HOT_TTL: Duration = Duration::from_secs(15 * 60);
/// Default retention window, accepted for API stability.
pub const DEFAULT_RETENTION_DAYS: u64 = 7;
/// Default engine memtable budget before flush.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Hot tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotTierConfig {
    /// Upper bound on resident entries.
    pub max_entries: u64,
    /// Write-age expiry: entries older than this are no longer served and are
    /// removed at the next maintenance pass.
    pub ttl: Duration,
}

impl Default for HotTierConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_CACHE_SIZE,
            ttl: DEFAULT_HOT_TTL,
        }
    }
}

/// Disk tier configuration with persistent storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskTierConfig {
    /// Directory holding the engine's files; created (with parents) if missing.
    pub path: PathBuf,
    /// Reserved. Accepted for API stability; cleanup wipes the whole store
    /// rather than expiring individual entries.
    pub retention_days: u64,
    /// Period of the full-wipe cleanup worker; zero disables it.
    pub cleanup_interval: Duration,
    /// Engine memtable budget before flush.
    pub write_buffer_size: usize,
    /// Upper bound on retained codec buffers.
    pub codec_pool_size: usize,
}

impl Default for DiskTierConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
            retention_days: DEFAULT_RETENTION_DAYS,
            cleanup_interval: Duration::ZERO,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            codec_pool_size: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Main cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub hot_tier: HotTierConfig,
    pub disk_tier: DiskTierConfig,
}
