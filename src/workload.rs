//! Soak workload: drives a cache from several concurrent workers and
//! records how its size responds to forced reclamation.
//!
//! Each worker writes its share of the key space (`"Value of {i}"` for key
//! `i`) and, after every write, re-reads an older key so that some lookups
//! land in the overflow tier and promote.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::stats::CacheStats;
use crate::cache::tiered::TieredCache;
use crate::config::WorkloadConfig;
use crate::reclaim::Reclaim;

/// Outcome of a soak run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub run_id: Uuid,
    pub keys_written: u64,
    pub reads: u64,
    pub read_hits: u64,
    /// `size()` once all workers finished, before the forced sweep.
    pub size_before_reclaim: usize,
    /// `size()` right after the forced sweep.
    pub size_after_reclaim: usize,
    pub reclaimed: usize,
    pub elapsed_ms: u64,
    pub stats: CacheStats,
}

#[derive(Debug, Default)]
struct WorkerTally {
    written: u64,
    reads: u64,
    hits: u64,
}

fn run_worker(
    cache: &TieredCache<u64, String>,
    worker: usize,
    workers: usize,
    keys: usize,
    reads_per_write: usize,
) -> WorkerTally {
    let mut tally = WorkerTally::default();
    for i in (worker..keys).step_by(workers) {
        let key = i as u64;
        cache.put(key, format!("Value of {key}"));
        tally.written += 1;

        for r in 1..=reads_per_write {
            let probe = key / (r as u64 + 1);
            tally.reads += 1;
            if cache.get(&probe).is_some() {
                tally.hits += 1;
            }
        }
    }
    tally
}

/// Run the soak workload against `cache`, then force one reclamation sweep.
pub async fn run_workload(
    cache: Arc<TieredCache<u64, String>>,
    config: &WorkloadConfig,
) -> anyhow::Result<WorkloadReport> {
    let run_id = Uuid::new_v4();
    let workers = config.workers.max(1);
    let start = Instant::now();

    info!(
        %run_id,
        keys = config.keys,
        workers,
        capacity = cache.capacity(),
        "Starting workload"
    );

    let handles = (0..workers).map(|worker| {
        let cache = cache.clone();
        let keys = config.keys;
        let reads_per_write = config.reads_per_write;
        tokio::task::spawn_blocking(move || {
            run_worker(&cache, worker, workers, keys, reads_per_write)
        })
    });

    let mut total = WorkerTally::default();
    for (worker, result) in join_all(handles).await.into_iter().enumerate() {
        let tally = result?;
        debug!(worker, written = tally.written, hits = tally.hits, "Worker finished");
        total.written += tally.written;
        total.reads += tally.reads;
        total.hits += tally.hits;
    }

    let size_before_reclaim = cache.size();
    let reclaimed = cache.reclaim();
    let size_after_reclaim = cache.size();
    let stats = cache.stats();

    let report = WorkloadReport {
        run_id,
        keys_written: total.written,
        reads: total.reads,
        read_hits: total.hits,
        size_before_reclaim,
        size_after_reclaim,
        reclaimed,
        elapsed_ms: start.elapsed().as_millis() as u64,
        stats,
    };

    info!(
        %run_id,
        size_before = report.size_before_reclaim,
        size_after = report.size_after_reclaim,
        reclaimed = report.reclaimed,
        hit_rate = report.stats.hit_rate(),
        elapsed_ms = report.elapsed_ms,
        "Workload complete"
    );

    Ok(report)
}
