//! Tiered cache: the coordinator between the hot and overflow tiers.
//!
//! The cache is the single owner of both tiers. It:
//! - Serves lookups from the hot tier first, then the overflow tier
//! - Promotes overflow hits back to the hot tier
//! - Demotes the least recently used hot entry when capacity is exceeded
//! - Prunes stale overflow registrations when their key is touched
//!
//! One lock guards both tiers, so every operation (including the
//! remove-from-one, insert-into-other moves) is atomic to other callers.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::hot::HotTier;
use crate::cache::overflow::{OverflowTier, Probe};
use crate::cache::stats::{CacheStats, Counters};
use crate::cache::tier::Tier;
use crate::config::CacheConfig;
use crate::reclaim::Reclaim;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}

struct Tiers<K, V> {
    hot: HotTier<K, V>,
    overflow: OverflowTier<K, V>,
    counters: Counters,
}

impl<K: Hash + Eq + Clone, V> Tiers<K, V> {
    /// Move an entry pushed out of the hot tier into the overflow tier.
    fn demote(&mut self, key: K, value: Arc<V>, soft_limit: Option<usize>) {
        self.overflow.insert(key, value);
        self.counters.demotions += 1;
        debug!(from = %Tier::Hot, to = %Tier::Overflow, "Demoted entry");

        if let Some(limit) = soft_limit {
            if self.overflow.retained() > limit {
                let reclaimed = self.sweep();
                debug!(limit, reclaimed, "Overflow soft limit exceeded, swept");
            }
        }
    }

    fn sweep(&mut self) -> usize {
        let reclaimed = self.overflow.sweep();
        self.counters.sweeps += 1;
        reclaimed
    }
}

/// A bounded LRU cache whose evicted entries survive, weakly held, until
/// they are reclaimed.
///
/// The hot tier holds at most `capacity` entries and keeps them resident.
/// Entries pushed out of it move to the overflow tier, which only keeps a
/// value reachable until the next reclamation sweep (see [`Reclaim`]) unless
/// a caller still holds the `Arc` returned by [`get`](Self::get).
pub struct TieredCache<K, V> {
    tiers: Mutex<Tiers<K, V>>,
    overflow_soft_limit: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> TieredCache<K, V> {
    /// Create a cache whose hot tier holds `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::from_config(&CacheConfig {
            capacity,
            ..Default::default()
        })
    }

    /// Create a cache from its configuration section.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        if config.capacity < 1 {
            return Err(CacheError::InvalidConfiguration(format!(
                "capacity must be at least 1, got {}",
                config.capacity
            )));
        }

        debug!(
            capacity = config.capacity,
            overflow_soft_limit = ?config.overflow_soft_limit,
            "Created tiered cache"
        );

        Ok(Self {
            tiers: Mutex::new(Tiers {
                hot: HotTier::new(config.capacity),
                overflow: OverflowTier::new(),
                counters: Counters::default(),
            }),
            overflow_soft_limit: config.overflow_soft_limit,
        })
    }

    /// Insert or replace `key`, making it the most recently used entry.
    pub fn put(&self, key: K, value: V) {
        self.put_shared(key, Arc::new(value));
    }

    /// Insert an already shared value.
    pub fn put_shared(&self, key: K, value: Arc<V>) {
        let mut tiers = self.tiers.lock();

        let value = match tiers.hot.update(&key, value) {
            Ok(_) => {
                tiers.counters.updates += 1;
                return;
            }
            Err(value) => value,
        };

        if let Probe::Stale = tiers.overflow.take(&key) {
            tiers.counters.stale_pruned += 1;
        }

        tiers.counters.insertions += 1;
        if let Some((evicted, evicted_value)) = tiers.hot.push(key, value) {
            tiers.demote(evicted, evicted_value, self.overflow_soft_limit);
        }
    }

    /// Look up `key`, promoting it from the overflow tier if needed.
    ///
    /// Returns `None` when the key was never inserted, was removed, or its
    /// overflow value has been reclaimed.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tiers = self.tiers.lock();

        if let Some(value) = tiers.hot.get(key) {
            tiers.counters.hot_hits += 1;
            return Some(value);
        }

        match tiers.overflow.take(key) {
            Probe::Live(key, value) => {
                tiers.counters.overflow_hits += 1;
                debug!(from = %Tier::Overflow, to = %Tier::Hot, "Promoted entry");
                if let Some((evicted, evicted_value)) = tiers.hot.push(key, Arc::clone(&value)) {
                    tiers.demote(evicted, evicted_value, self.overflow_soft_limit);
                }
                Some(value)
            }
            Probe::Stale => {
                tiers.counters.misses += 1;
                tiers.counters.stale_pruned += 1;
                None
            }
            Probe::Absent => {
                tiers.counters.misses += 1;
                None
            }
        }
    }

    /// Remove `key` from whichever tier holds it.
    ///
    /// Returns whether a live entry was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tiers = self.tiers.lock();

        if tiers.hot.remove(key).is_some() {
            tiers.counters.removals += 1;
            return true;
        }

        match tiers.overflow.take(key) {
            Probe::Live(..) => {
                tiers.counters.removals += 1;
                true
            }
            Probe::Stale => {
                tiers.counters.stale_pruned += 1;
                false
            }
            Probe::Absent => false,
        }
    }

    /// Whether `key` is present in either tier, without touching recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tiers = self.tiers.lock();
        tiers.hot.contains(key) || tiers.overflow.contains_live(key)
    }

    /// Hot entries plus overflow entries whose value is alive right now.
    ///
    /// This is a snapshot. Two calls with no operation in between may
    /// disagree if a value held outside the cache is dropped.
    pub fn size(&self) -> usize {
        let tiers = self.tiers.lock();
        tiers.hot.len() + tiers.overflow.live_len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Keys of hot entries plus overflow entries whose value is alive.
    pub fn key_set(&self) -> HashSet<K> {
        let tiers = self.tiers.lock();
        tiers
            .hot
            .keys()
            .chain(tiers.overflow.live_keys())
            .cloned()
            .collect()
    }

    /// Keys guaranteed resident, most recently used first.
    pub fn hot_keys(&self) -> Vec<K> {
        self.tiers.lock().hot.keys().cloned().collect()
    }

    /// Number of entries in the hot tier.
    pub fn hot_len(&self) -> usize {
        self.tiers.lock().hot.len()
    }

    pub fn capacity(&self) -> usize {
        self.tiers.lock().hot.capacity()
    }

    /// Drop every entry from both tiers.
    pub fn clear(&self) {
        let mut tiers = self.tiers.lock();
        tiers.hot.clear();
        tiers.overflow.clear();
    }

    /// Drop overflow registrations whose value has been reclaimed.
    pub fn purge_stale(&self) -> usize {
        let mut tiers = self.tiers.lock();
        let pruned = tiers.overflow.purge_stale();
        tiers.counters.stale_pruned += pruned as u64;
        pruned
    }

    /// Counters plus current tier occupancy.
    pub fn stats(&self) -> CacheStats {
        let tiers = self.tiers.lock();
        CacheStats {
            capacity: tiers.hot.capacity(),
            hot_len: tiers.hot.len(),
            overflow_live: tiers.overflow.live_len(),
            overflow_retained: tiers.overflow.retained(),
            overflow_registrations: tiers.overflow.registrations(),
            reclaimed: tiers.overflow.reclaimed(),
            ..CacheStats::from_counters(&tiers.counters)
        }
    }
}

impl<K: Hash + Eq + Clone, V> Reclaim for TieredCache<K, V> {
    fn reclaim(&self) -> usize {
        let mut tiers = self.tiers.lock();
        let reclaimed = tiers.sweep();
        if reclaimed > 0 {
            info!(
                reclaimed,
                remaining = tiers.overflow.live_len(),
                hot = tiers.hot.len(),
                "Reclaimed overflow entries"
            );
        }
        reclaimed
    }

    fn purge_stale(&self) -> usize {
        TieredCache::purge_stale(self)
    }
}

impl<K, V> std::fmt::Debug for TieredCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("overflow_soft_limit", &self.overflow_soft_limit)
            .finish_non_exhaustive()
    }
}

/// Thread-safe shared handle to a cache.
pub type SharedCache<K, V> = Arc<TieredCache<K, V>>;

/// Create a new shared cache.
pub fn new_shared_cache<K: Hash + Eq + Clone, V>(
    config: &CacheConfig,
) -> Result<SharedCache<K, V>, CacheError> {
    TieredCache::from_config(config).map(Arc::new)
}
