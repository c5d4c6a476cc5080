//! Two-tier cache.
//!
//! This module contains the cache data structures:
//! - [`tier`]: Tier definitions
//! - [`hot`]: Capacity-bounded LRU tier with strong ownership
//! - [`overflow`]: Unbounded tier holding demoted values weakly
//! - [`tiered`]: Coordinator that promotes and demotes between the two
//! - [`stats`]: Counters and occupancy snapshots

pub mod hot;
pub mod overflow;
pub mod stats;
pub mod tier;
pub mod tiered;

pub use stats::CacheStats;
pub use tier::Tier;
pub use tiered::{new_shared_cache, CacheError, SharedCache, TieredCache};
