//! Runtime configuration for tiered-cache.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! Cache sizing, reclamation cadence and the soak workload shape live here.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tiered-cache",
    about = "Soak-test a bounded LRU cache with a weakly-held overflow tier"
)]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Override the hot-tier capacity.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Override the number of distinct keys written by the workload.
    #[arg(long)]
    pub keys: Option<usize>,

    /// Override the number of concurrent workload workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache sizing.
    pub cache: CacheConfig,

    /// Background reclamation.
    pub reclaim: ReclaimConfig,

    /// Soak workload shape.
    pub workload: WorkloadConfig,
}

/// Cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries in the hot tier (must be >= 1).
    pub capacity: usize,

    /// Sweep the overflow tier once more than this many demoted values are
    /// still strongly held (None = only sweep when asked).
    pub overflow_soft_limit: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            overflow_soft_limit: None,
        }
    }
}

/// Background reclaimer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    /// Run the background reclaimer.
    pub enabled: bool,

    /// Milliseconds between sweeps.
    pub interval_ms: u64,

    /// Drop stale overflow registrations after each sweep.
    pub purge_stale: bool,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
            purge_stale: true,
        }
    }
}

/// Soak workload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Distinct keys written across all workers.
    pub keys: usize,

    /// Concurrent workers.
    pub workers: usize,

    /// Reads issued after every write (each re-reads an older key).
    pub reads_per_write: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            keys: 100_000,
            workers: 4,
            reads_per_write: 1,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(capacity) = cli.capacity {
            self.cache.capacity = capacity;
        }
        if let Some(keys) = cli.keys {
            self.workload.keys = keys;
        }
        if let Some(workers) = cli.workers {
            self.workload.workers = workers;
        }
    }

    /// Reject settings that cannot produce a working run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.capacity",
                reason: "must be at least 1",
            });
        }
        if self.reclaim.enabled && self.reclaim.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "reclaim.interval_ms",
                reason: "must be non-zero when reclamation is enabled",
            });
        }
        if self.workload.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workload.workers",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
