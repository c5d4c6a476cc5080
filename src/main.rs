//! tiered-cache: soak runner for the two-tier cache.
//!
//! Builds a cache from configuration, optionally starts the background
//! reclaimer, drives the cache from concurrent workers and reports how its
//! size behaves before and after a forced reclamation sweep.

use clap::Parser;
use tracing::info;

use tiered_cache::cache::new_shared_cache;
use tiered_cache::config::{Cli, Config};
use tiered_cache::metrics::CacheMetrics;
use tiered_cache::reclaim::spawn_reclaimer;
use tiered_cache::workload::run_workload;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "tiered_cache=debug"
    } else {
        "tiered_cache=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("tiered-cache v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);
    config.validate()?;

    info!(
        capacity = config.cache.capacity,
        overflow_soft_limit = ?config.cache.overflow_soft_limit,
        reclaim_enabled = config.reclaim.enabled,
        reclaim_interval_ms = config.reclaim.interval_ms,
        "Configuration loaded"
    );

    let cache = new_shared_cache::<u64, String>(&config.cache)?;

    let reclaimer = if config.reclaim.enabled {
        Some(spawn_reclaimer(cache.clone(), &config.reclaim))
    } else {
        None
    };

    let report = run_workload(cache.clone(), &config.workload).await?;

    if let Some(reclaimer) = reclaimer {
        let sweeps = reclaimer.shutdown().await;
        info!(sweeps, "Background reclaimer finished");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    if cli.metrics {
        let metrics = CacheMetrics::new()?;
        metrics.observe(&cache.stats());
        print!("{}", metrics.encode()?);
    }

    Ok(())
}
