use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::fetcher::CommitSource;
use super::models::Commit;

/// What the activity list currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityState {
    Loading,
    Ready {
        commits: Vec<Commit>,
        /// `commits` is the sample list because the last refresh failed
        demo: bool,
    },
}

/// Repeating refresh of the activity list
pub struct ActivityPoller {
    source: Arc<dyn CommitSource>,
    interval: Duration,
    demo: Vec<Commit>,
    state_tx: watch::Sender<ActivityState>,
}

impl ActivityPoller {
    pub fn new(source: Arc<dyn CommitSource>, interval: Duration, demo: Vec<Commit>) -> Self {
        let (state_tx, _) = watch::channel(ActivityState::Loading);
        Self {
            source,
            interval: interval.max(Duration::from_secs(1)),
            demo,
            state_tx,
        }
    }

    /// Start polling: one refresh right away, then one per interval, until
    /// the returned handle is torn down
    pub fn spawn(self) -> ActivityHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state_rx = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));

        ActivityHandle {
            shutdown_tx,
            state_rx,
            task,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Activity poller started: interval={}s", self.interval.as_secs());

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = interval.tick() => {
                    debug!("Refreshing GitHub activity");
                    tokio::select! {
                        _ = wait_for_shutdown(&mut shutdown) => break,
                        _ = self.refresh() => {}
                    }
                }
            }
        }

        info!("Activity poller stopped");
    }

    async fn refresh(&self) {
        let state = match self.source.fetch_commits().await {
            Ok(commits) => ActivityState::Ready {
                commits,
                demo: false,
            },
            Err(e) => {
                warn!("Failed to fetch GitHub activity: {}", e);
                ActivityState::Ready {
                    commits: self.demo.clone(),
                    demo: true,
                }
            }
        };
        self.state_tx.send_replace(state);
    }
}

/// Resolves once shutdown is requested or the handle is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Owner of a running poller
pub struct ActivityHandle {
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ActivityState>,
    task: JoinHandle<()>,
}

impl ActivityHandle {
    pub fn subscribe(&self) -> watch::Receiver<ActivityState> {
        self.state_rx.clone()
    }

    pub fn state(&self) -> ActivityState {
        self.state_rx.borrow().clone()
    }

    /// Cancel the poller, including an in-flight refresh, and wait for it to stop
    pub async fn teardown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Activity poller ended abnormally: {}", e);
        }
    }
}
