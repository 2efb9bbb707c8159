//! Background reclamation of expired entries.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error};

use ttlkv_core::error::{Result, TtlkvError};

use crate::cache::Store;

/// Owner side of a running sweeper task.
pub(crate) struct SweeperHandle {
    /// Sender to signal shutdown to the sweep loop
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawns the sweep loop on the current Tokio runtime.
    ///
    /// The loop only holds a weak reference to the store, so it also ends
    /// once every cache handle is gone.
    pub(crate) fn spawn<V>(store: &Arc<Store<V>>, period: Duration) -> Result<Self>
    where
        V: Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TtlkvError::RuntimeUnavailable)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Anchored here rather than inside the task, so the first tick is one
        // period after construction no matter when the task is first polled.
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task = runtime.spawn(sweep_loop(Arc::downgrade(store), ticker, shutdown_rx));
        debug!(period_ms = period.as_millis() as u64, "Sweeper started");

        Ok(Self { shutdown_tx, task })
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    #[cfg(test)]
    pub(crate) fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.task.abort_handle()
    }

    /// Signals the loop to stop and waits for it.
    pub(crate) async fn stop(self) {
        // Err means the loop already exited and dropped its receiver.
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            error!(error = %err, "Sweeper task ended abnormally");
        }
    }
}

async fn sweep_loop<V>(
    store: Weak<Store<V>>,
    mut ticker: Interval,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(strong) = store.upgrade() else {
                    break;
                };
                if let Some(removed) = isolated_tick(|| strong.purge_expired()) {
                    if removed > 0 {
                        debug!(removed, "Swept expired entries");
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Sweeper stopped");
}

/// Runs one tick, containing any panic so the loop survives it.
fn isolated_tick<F>(tick: F) -> Option<usize>
where
    F: FnOnce() -> usize,
{
    match panic::catch_unwind(AssertUnwindSafe(tick)) {
        Ok(removed) => Some(removed),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!(%reason, "Sweep tick panicked, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_store_dropped() {
        let store = Arc::new(Store::<u32>::new(0));
        let handle = SweeperHandle::spawn(&store, Duration::from_secs(1)).unwrap();
        assert!(handle.is_running());

        drop(store);
        // The next tick finds nothing to upgrade.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_sender_dropped() {
        let store = Arc::new(Store::<u32>::new(0));
        let SweeperHandle { shutdown_tx, task } =
            SweeperHandle::spawn(&store, Duration::from_secs(60)).unwrap();

        drop(shutdown_tx);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(task.is_finished());
        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_joins_task() {
        let store = Arc::new(Store::<u32>::new(0));
        let handle = SweeperHandle::spawn(&store, Duration::from_secs(1)).unwrap();
        let task = handle.abort_handle();

        handle.stop().await;
        assert!(task.is_finished());
    }

    #[test]
    fn test_isolated_tick_passes_result() {
        assert_eq!(isolated_tick(|| 3), Some(3));
    }

    #[test]
    fn test_isolated_tick_contains_panic() {
        assert_eq!(isolated_tick(|| panic!("boom")), None);
        // The next tick runs normally.
        assert_eq!(isolated_tick(|| 1), Some(1));
    }
}
