//! Cache counters and point-in-time statistics.

use serde::{Deserialize, Serialize};

/// Running counters, updated under the cache lock.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hot_hits: u64,
    pub overflow_hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub updates: u64,
    pub demotions: u64,
    pub removals: u64,
    pub sweeps: u64,
    pub stale_pruned: u64,
}

/// Snapshot of cache activity and tier occupancy.
///
/// Occupancy fields are sampled at the moment the snapshot is taken; the
/// overflow figures may already be out of date when the caller reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Configured hot-tier capacity.
    pub capacity: usize,
    /// Entries resident in the hot tier.
    pub hot_len: usize,
    /// Overflow registrations whose value is alive.
    pub overflow_live: usize,
    /// Overflow values still strongly held, pending the next sweep.
    pub overflow_retained: usize,
    /// All overflow registrations, including stale ones.
    pub overflow_registrations: usize,

    pub hot_hits: u64,
    /// Overflow hits; each one is a promotion.
    pub overflow_hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub updates: u64,
    pub demotions: u64,
    pub removals: u64,
    /// Reclamation sweeps run against the overflow tier.
    pub sweeps: u64,
    /// Overflow values found unreachable, each counted once whether a sweep
    /// or a later touch of its stale registration noticed it.
    pub reclaimed: u64,
    /// Stale overflow registrations dropped.
    pub stale_pruned: u64,
}

impl CacheStats {
    pub(crate) fn from_counters(counters: &Counters) -> Self {
        Self {
            hot_hits: counters.hot_hits,
            overflow_hits: counters.overflow_hits,
            misses: counters.misses,
            insertions: counters.insertions,
            updates: counters.updates,
            demotions: counters.demotions,
            removals: counters.removals,
            sweeps: counters.sweeps,
            stale_pruned: counters.stale_pruned,
            ..Default::default()
        }
    }

    /// Total number of `get` calls.
    pub fn lookups(&self) -> u64 {
        self.hot_hits + self.overflow_hits + self.misses
    }

    /// Hit rate across both tiers (0.0 - 1.0). Returns 0.0 if no lookups.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            return 0.0;
        }
        (self.hot_hits + self.overflow_hits) as f64 / lookups as f64
    }

    /// Entries visible to callers: hot plus live overflow.
    pub fn size(&self) -> usize {
        self.hot_len + self.overflow_live
    }
}
