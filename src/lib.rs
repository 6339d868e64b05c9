//! Permafrost - tiered read-through cache with durable eviction spillover
//!
//! A three-tier key-value cache built to stay available through outages of
//! the authoritative data source:
//!
//! - **Hot tier**: bounded in-memory cache with W-TinyLFU eviction and
//!   write-age expiry, serving lookups in microseconds
//! - **Repository**: the external source of truth, consulted on hot misses;
//!   may be slow and may fail or disappear entirely
//! - **Disk tier**: compressed persistent store that absorbs every hot tier
//!   eviction, so evicted entries remain recoverable while the repository
//!   is down
//!
//! Lookups walk the tiers in order and promote recovered values back into
//! the hot tier. Writes go to the hot tier only; the disk tier is populated
//! exclusively by eviction spillover.
//!
//! # Usage
//!
//! ```no_run
//! use permafrost::Permafrost;
//!
//! let cache: Permafrost<String, String> = Permafrost::builder()
//!     .store_path("./tier_cache_db")
//!     .max_cache_size(1000)
//!     .build()
//!     .expect("cache construction");
//!
//! cache.put("key".to_string(), "value".to_string()).unwrap();
//! assert_eq!(cache.get(&"key".to_string()).unwrap().as_deref(), Some("value"));
//! cache.close().unwrap();
//! ```

// Public API modules
pub mod permafrost;
pub mod prelude;

// Cache implementation modules
pub mod cache;

// Re-export the public API at the crate root for convenience
pub use cache::repository::{MemoryRepository, Repository};
pub use cache::tier::cold::DiskTier;
pub use cache::types::CacheError;
pub use permafrost::{Permafrost, PermafrostBuilder};
pub use prelude::*;
