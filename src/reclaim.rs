//! Reclamation: the out-of-band sweep that invalidates weakly held values.
//!
//! Reclamation is not part of the cache's own API. It is a capability that
//! something outside the cache's call sequence exercises: a test forcing a
//! sweep, or the background [`spawn_reclaimer`] task ticking on a timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ReclaimConfig;

/// Something whose weakly held values can be swept.
pub trait Reclaim {
    /// Downgrade every value still strongly held pending reclamation.
    ///
    /// Returns how many values became unreachable.
    fn reclaim(&self) -> usize;

    /// Drop registrations whose value is already gone.
    fn purge_stale(&self) -> usize {
        0
    }
}

/// Handle to a running background reclaimer.
///
/// Dropping the handle stops the task at its next wakeup.
pub struct ReclaimerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<u64>,
}

impl ReclaimerHandle {
    /// Stop the reclaimer and wait for it to exit.
    ///
    /// Returns the number of sweeps it ran.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(sweeps) => sweeps,
            Err(e) => {
                warn!(error = %e, "Reclaimer task failed");
                0
            }
        }
    }
}

/// Spawn a task that sweeps `target` every `config.interval_ms`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_reclaimer<T>(target: Arc<T>, config: &ReclaimConfig) -> ReclaimerHandle
where
    T: Reclaim + Send + Sync + 'static,
{
    let (shutdown, mut shutdown_rx) = oneshot::channel();
    let interval = Duration::from_millis(config.interval_ms.max(1));
    let purge_stale = config.purge_stale;

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_ms = interval.as_millis() as u64, "Reclaimer started");

        let mut sweeps = 0u64;
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    let reclaimed = target.reclaim();
                    let pruned = if purge_stale { target.purge_stale() } else { 0 };
                    sweeps += 1;
                    debug!(reclaimed, pruned, sweeps, "Reclaimer sweep");
                }
            }
        }

        info!(sweeps, "Reclaimer stopped");
        sweeps
    });

    ReclaimerHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTarget {
        reclaims: AtomicUsize,
        purges: AtomicUsize,
    }

    impl Reclaim for CountingTarget {
        fn reclaim(&self) -> usize {
            self.reclaims.fetch_add(1, Ordering::SeqCst);
            0
        }

        fn purge_stale(&self) -> usize {
            self.purges.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    fn config(interval_ms: u64, purge_stale: bool) -> ReclaimConfig {
        ReclaimConfig {
            enabled: true,
            interval_ms,
            purge_stale,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaimer_ticks_until_shutdown() {
        let target = Arc::new(CountingTarget::default());
        let handle = spawn_reclaimer(target.clone(), &config(100, true));

        tokio::time::sleep(Duration::from_millis(350)).await;
        let sweeps = handle.shutdown().await;

        assert_eq!(sweeps, 3);
        assert_eq!(target.reclaims.load(Ordering::SeqCst), 3);
        assert_eq!(target.purges.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reclaimer_skips_purge_when_disabled() {
        let target = Arc::new(CountingTarget::default());
        let handle = spawn_reclaimer(target.clone(), &config(50, false));

        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.shutdown().await;

        assert!(target.reclaims.load(Ordering::SeqCst) >= 2);
        assert_eq!(target.purges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_reclaimer() {
        let target = Arc::new(CountingTarget::default());
        let handle = spawn_reclaimer(target.clone(), &config(10, false));
        drop(handle);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(target.reclaims.load(Ordering::SeqCst), 0);
    }
}
