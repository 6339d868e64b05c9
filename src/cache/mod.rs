//! Cache implementation modules
//!
//! The tier coordinator resolves lookups across the hot tier, the
//! authoritative repository, and the persistent disk tier; the remaining
//! modules supply the tiers, the binary codec, configuration, and errors.

pub mod config;
pub mod coordinator;
pub mod repository;
pub mod serde;
pub mod tier;
pub mod types;
