//! Convenience re-exports for common usage

pub use crate::cache::config::{CacheConfig, DiskTierConfig, HotTierConfig};
pub use crate::cache::repository::{MemoryRepository, Repository};
pub use crate::cache::serde::CodecPool;
pub use crate::cache::tier::cold::DiskTier;
pub use crate::cache::tier::hot::{EvictionCause, HotTier};
pub use crate::cache::types::CacheError;
pub use crate::permafrost::{Permafrost, PermafrostBuilder};
