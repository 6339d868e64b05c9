//! Error handling types shared across the cache tiers
//!
//! Every fallible operation in the crate reports a [`CacheError`]. The
//! coordinator swallows repository and disk errors on the lookup path to keep
//! the cache available through outages; all other callers see them.

use std::fmt;

/// Cache operation error types
///
/// One enum covers the whole crate so callers can match on the failure
/// category without chasing per-module error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction failed: bad storage path or the engine refused to open.
    Init(String),
    /// A disk tier operation failed inside the storage engine.
    Disk(String),
    /// A value could not be encoded for disk storage.
    Serialization(String),
    /// Stored bytes could not be decoded back into the requested type.
    Deserialization(String),
    /// The authoritative repository reported a failure or is unavailable.
    Repository(String),
    /// The named component was used after `close()`.
    Closed(&'static str),
    /// A blocked call was interrupted; component state remains consistent.
    Cancelled,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Init(msg) => write!(f, "initialization failed: {}", msg),
            CacheError::Disk(msg) => write!(f, "disk tier error: {}", msg),
            CacheError::Serialization(msg) => write!(f, "serialization error: {}", msg),
            CacheError::Deserialization(msg) => {
                write!(f, "deserialization error: {}", msg)
            }
            CacheError::Repository(msg) => write!(f, "repository error: {}", msg),
            CacheError::Closed(component) => write!(f, "{} is closed", component),
            CacheError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for CacheError {}

impl CacheError {
    /// Create an initialization error
    #[inline(always)]
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a disk tier error
    #[inline(always)]
    pub fn disk(msg: impl Into<String>) -> Self {
        Self::Disk(msg.into())
    }

    /// Create a serialization error
    #[inline(always)]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a deserialization error
    #[inline(always)]
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Create a repository error
    #[inline(always)]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a use-after-close error for the named component
    #[inline(always)]
    pub fn closed(component: &'static str) -> Self {
        Self::Closed(component)
    }

    /// Check whether this error reports use after `close()`
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl From<rocksdb::Error> for CacheError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Disk(err.to_string())
    }
}
