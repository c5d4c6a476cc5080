//! tiered-cache: bounded LRU cache with a weakly-held overflow tier.
//!
//! Recently used entries stay resident in a fixed-capacity hot tier.
//! Entries pushed out of it are not deleted but demoted to an overflow
//! tier that holds them weakly, so they keep serving hits until a
//! reclamation sweep finds that nothing else is holding them.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod reclaim;
pub mod workload;

pub use cache::{CacheError, CacheStats, TieredCache};
pub use reclaim::{spawn_reclaimer, Reclaim, ReclaimerHandle};
