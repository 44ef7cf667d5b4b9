//! Progress reporting while a worker is provisioned.
//!
//! Provisioning can take minutes. Callers that want feedback register a
//! [`ProgressObserver`]; without one, no background task is started.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};

// ============================================================================
// Constants
// ============================================================================

/// Interval between progress notifications.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// ProvisioningProgress
// ============================================================================

/// Snapshot passed to observers on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningProgress {
    /// Time since the provisioning request was sent.
    pub elapsed: Duration,
    /// Zero-based tick counter.
    pub tick: u32,
}

// ============================================================================
// ProgressObserver
// ============================================================================

/// Receives provisioning progress.
///
/// Any `Fn(ProvisioningProgress) + Send + Sync` closure is an observer.
///
/// # Example
///
/// ```
/// use vizion::VizionClient;
///
/// let client = VizionClient::builder()
///     .api_key("vz_live_example")
///     .on_progress(|p: vizion::ProvisioningProgress| {
///         eprint!("\r  Waiting for GPU worker ... {}s", p.elapsed.as_secs());
///     })
///     .build();
/// assert!(client.is_ok());
/// ```
pub trait ProgressObserver: Send + Sync {
    /// Called periodically while waiting, starting immediately.
    fn on_progress(&self, progress: ProvisioningProgress);

    /// Called once when the wait ends, successfully or not.
    fn on_finished(&self, _elapsed: Duration) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(ProvisioningProgress) + Send + Sync,
{
    fn on_progress(&self, progress: ProvisioningProgress) {
        self(progress);
    }
}

// ============================================================================
// Ticker
// ============================================================================

/// Background task driving a [`ProgressObserver`].
pub(crate) struct Ticker {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    observer: Arc<dyn ProgressObserver>,
    started: Instant,
}

impl Ticker {
    /// Starts ticking immediately, then every `period`.
    pub(crate) fn start(observer: Arc<dyn ProgressObserver>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let started = Instant::now();
        let task_observer = Arc::clone(&observer);

        let task = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0u32;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticks.tick() => {
                        task_observer.on_progress(ProvisioningProgress {
                            elapsed: started.elapsed(),
                            tick,
                        });
                        tick = tick.saturating_add(1);
                    }
                }
            }
        });

        Self {
            stop_tx,
            task,
            observer,
            started,
        }
    }

    /// Stops the task and waits for it, then notifies the observer.
    pub(crate) async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.task.await;
        self.observer.on_finished(self.started.elapsed());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        ticks: AtomicU32,
        finished: AtomicUsize,
    }

    impl ProgressObserver for Counting {
        fn on_progress(&self, progress: ProvisioningProgress) {
            self.ticks.store(progress.tick + 1, Ordering::SeqCst);
        }

        fn on_finished(&self, _elapsed: Duration) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reports_until_stopped() {
        let observer = Arc::new(Counting::default());
        let ticker = Ticker::start(observer.clone(), PROGRESS_INTERVAL);

        tokio::time::sleep(Duration::from_secs(5)).await;
        ticker.stop().await;
        let ticks = observer.ticks.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(ticks >= 2, "expected several ticks, got {ticks}");
        assert_eq!(observer.ticks.load(Ordering::SeqCst), ticks);
        assert_eq!(observer.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closure_observer() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = Arc::clone(&seen);
        let observer: Arc<dyn ProgressObserver> = Arc::new(move |_p: ProvisioningProgress| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        let ticker = Ticker::start(observer, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(35)).await;
        ticker.stop().await;

        assert!(seen.load(Ordering::SeqCst) >= 1);
    }
}
