//! Prometheus export of cache statistics.
//!
//! The cache keeps plain counters under its own lock; this module mirrors a
//! [`CacheStats`] snapshot into a private registry on demand.

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::cache::stats::CacheStats;
use crate::cache::tier::Tier;

/// Metric handles for one cache instance.
pub struct CacheMetrics {
    registry: Registry,
    lookups: IntCounterVec,
    demotions: IntCounter,
    reclaimed: IntCounter,
    stale_pruned: IntCounter,
    sweeps: IntCounter,
    entries: IntGaugeVec,
    capacity: IntGauge,
}

impl CacheMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let lookups = IntCounterVec::new(
            Opts::new("tiered_cache_lookups_total", "Cache lookups by outcome"),
            &["outcome"],
        )?;
        let demotions = IntCounter::new(
            "tiered_cache_demotions_total",
            "Entries moved from the hot tier to the overflow tier",
        )?;
        let reclaimed = IntCounter::new(
            "tiered_cache_reclaimed_total",
            "Overflow values that became unreachable during a sweep",
        )?;
        let stale_pruned = IntCounter::new(
            "tiered_cache_stale_pruned_total",
            "Stale overflow registrations dropped",
        )?;
        let sweeps = IntCounter::new("tiered_cache_sweeps_total", "Reclamation sweeps")?;
        let entries = IntGaugeVec::new(
            Opts::new("tiered_cache_entries", "Live entries per tier"),
            &["tier"],
        )?;
        let capacity = IntGauge::new("tiered_cache_capacity", "Hot-tier capacity")?;

        registry.register(Box::new(lookups.clone()))?;
        registry.register(Box::new(demotions.clone()))?;
        registry.register(Box::new(reclaimed.clone()))?;
        registry.register(Box::new(stale_pruned.clone()))?;
        registry.register(Box::new(sweeps.clone()))?;
        registry.register(Box::new(entries.clone()))?;
        registry.register(Box::new(capacity.clone()))?;

        Ok(Self {
            registry,
            lookups,
            demotions,
            reclaimed,
            stale_pruned,
            sweeps,
            entries,
            capacity,
        })
    }

    /// Bring every metric up to date with `stats`.
    pub fn observe(&self, stats: &CacheStats) {
        advance(&self.lookups.with_label_values(&["hot_hit"]), stats.hot_hits);
        advance(
            &self.lookups.with_label_values(&["overflow_hit"]),
            stats.overflow_hits,
        );
        advance(&self.lookups.with_label_values(&["miss"]), stats.misses);
        advance(&self.demotions, stats.demotions);
        advance(&self.reclaimed, stats.reclaimed);
        advance(&self.stale_pruned, stats.stale_pruned);
        advance(&self.sweeps, stats.sweeps);

        self.entries
            .with_label_values(&[Tier::Hot.label()])
            .set(stats.hot_len as i64);
        self.entries
            .with_label_values(&[Tier::Overflow.label()])
            .set(stats.overflow_live as i64);
        self.capacity.set(stats.capacity as i64);
    }

    /// Render the registry in the prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Counters only move forward; snapshots are cumulative.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
