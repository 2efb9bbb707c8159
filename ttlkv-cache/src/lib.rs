//! Expiring cache engine for ttlkv.
//!
//! A concurrent map with per-entry TTL. Expired entries are reclaimed
//! lazily by the read that finds them and actively by a background sweeper.

mod cache;
mod sweeper;

pub use cache::{CacheConfig, ExpiringCache};
