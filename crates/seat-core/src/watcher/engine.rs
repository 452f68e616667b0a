use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::extract::extract_count;
use crate::loader::PageLoader;
use crate::notify::{slot_free_message, Notifier, STARTUP_MESSAGE};
use crate::observation::{Observation, ObservationLog};
use crate::watcher::state::{CheckOutcome, WatchState};

/// Decide whether a reading warrants a notification: the count must be
/// below the threshold and differ from the previous reading.
pub fn should_notify(count: u64, threshold: u64, previous: Option<u64>) -> bool {
    count < threshold && previous != Some(count)
}

/// Polls the event page and notifies when a slot opens up.
///
/// The only state carried between checks is the last observed count.
pub struct Watcher {
    config: WatchConfig,
    loader: Arc<dyn PageLoader>,
    notifier: Arc<dyn Notifier>,
    log: ObservationLog,
    last_count: Option<u64>,
}

impl Watcher {
    pub fn new(
        config: WatchConfig,
        loader: Arc<dyn PageLoader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let log = ObservationLog::new(config.log_path.clone());
        Self {
            config,
            loader,
            notifier,
            log,
            last_count: None,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn last_count(&self) -> Option<u64> {
        self.last_count
    }

    /// Run one check: fetch, extract, record, maybe notify.
    pub async fn check_once(&mut self) -> CheckOutcome {
        let url = self.config.url.as_str();

        let body = match self.loader.load(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "Could not read participant count");
                return CheckOutcome::Unavailable;
            }
        };

        let Some(count) = extract_count(&body) else {
            warn!(url, "No participant count found on page");
            return CheckOutcome::Unavailable;
        };

        let threshold = self.config.threshold;
        info!(count, threshold, "Current participant count");

        if let Err(e) = self.log.append(&Observation::new(count)).await {
            warn!(path = %self.log.path().display(), error = %e, "Failed to append observation");
        }

        let notified = should_notify(count, threshold, self.last_count);
        if notified {
            let message = slot_free_message(count, threshold, url);
            let delivery = self.notifier.notify(&message).await;
            debug!(count, ?delivery, "Slot notification attempted");
        }

        self.last_count = Some(count);
        CheckOutcome::Observed { count, notified }
    }

    /// Check, then sleep the poll interval, until `shutdown` resolves.
    ///
    /// A shutdown that fires during a check takes effect once the check is
    /// done.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            self.check_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = &mut shutdown => break,
            }
        }
    }

    /// Announce the watch through the notifier, then spawn the loop.
    pub async fn start(self) -> WatcherHandle {
        let delivery = self.notifier.notify(STARTUP_MESSAGE).await;
        debug!(?delivery, "Startup notification attempted");
        self.spawn()
    }

    /// Move the watcher onto a tokio task.
    ///
    /// Dropping the returned handle stops the loop at its next sleep.
    pub fn spawn(self) -> WatcherHandle {
        let state = Arc::new(RwLock::new(WatchState::Active));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        info!(
            url = %self.config.url,
            interval_secs = self.config.poll_interval.as_secs(),
            threshold = self.config.threshold,
            "Starting watcher"
        );

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let mut watcher = self;
            let shutdown = async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            };
            watcher.run(shutdown).await;

            *task_state.write().await = WatchState::Stopped;
            info!("Watcher stopped");
            watcher
        });

        WatcherHandle {
            state,
            stop_tx,
            task,
        }
    }
}

pub struct WatcherHandle {
    state: Arc<RwLock<WatchState>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Watcher>,
}

impl WatcherHandle {
    pub async fn state(&self) -> WatchState {
        *self.state.read().await
    }

    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if state.can_transition_to(WatchState::Stopping) {
            *state = WatchState::Stopping;
            info!("Stopping watcher");
        }
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the task to finish and hand the watcher back.
    pub async fn join(self) -> Result<Watcher, JoinError> {
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_only_below_threshold() {
        assert!(should_notify(44, 45, None));
        assert!(!should_notify(45, 45, None));
        assert!(!should_notify(46, 45, Some(40)));
    }

    #[test]
    fn notifies_only_on_change() {
        assert!(should_notify(40, 45, Some(45)));
        assert!(!should_notify(40, 45, Some(40)));
        assert!(should_notify(40, 45, Some(42)));
        assert!(should_notify(42, 45, Some(40)));
    }

    #[test]
    fn zero_threshold_never_notifies() {
        assert!(!should_notify(0, 0, None));
    }
}
