//! Per-feed poll loop.
//!
//! Each feed gets its own [`FeedPoller`] task that owns the feed's state.
//! A cycle:
//! 1. Fetch the feed; on error, log and wait for the next tick
//! 2. On the first successful fetch, prime the state (unless announcing existing items)
//! 3. Work out the new items, oldest first
//! 4. Publish them one by one; stop at the first failure
//! 5. Save state if anything changed
//!
//! Cycles for one feed never overlap: the loop awaits a cycle before
//! looking at the timer or the message channel again.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::Notifier;
use crate::config::{DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
use crate::feed::{FeedFetcher, FeedItem, FeedState};

/// Messages that can be sent to a poller.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Run a cycle now.
    TriggerUpdate,
    /// Stop the poller.
    Shutdown,
}

/// What a single poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed could not be fetched; state untouched.
    FetchFailed,
    /// First fetch: existing items were recorded without announcing them.
    Primed { fetched: usize },
    /// Every new item was delivered.
    Completed { fetched: usize, delivered: usize },
    /// Delivery failed; `pending` items wait for the next cycle.
    Interrupted { delivered: usize, pending: usize },
}

impl CycleOutcome {
    /// Number of items delivered in the cycle.
    #[must_use]
    pub const fn delivered(&self) -> usize {
        match self {
            Self::Completed { delivered, .. } | Self::Interrupted { delivered, .. } => *delivered,
            Self::FetchFailed | Self::Primed { .. } => 0,
        }
    }

    const fn changed_state(&self) -> bool {
        matches!(self, Self::Primed { .. }) || self.delivered() > 0
    }
}

/// Polls one feed and announces its new items.
pub struct FeedPoller<N> {
    /// Feed id used in logs and for the state file.
    id: String,

    fetcher: FeedFetcher,

    state: FeedState,

    notifier: N,

    poll_interval: Duration,

    /// Where to save state after a change. `None` keeps it in memory.
    state_path: Option<PathBuf>,

    /// Announce items already present on the first fetch.
    announce_existing: bool,
}

impl<N: Notifier + 'static> FeedPoller<N> {
    /// Creates a new poller.
    #[must_use]
    pub fn new(id: impl Into<String>, fetcher: FeedFetcher, state: FeedState, notifier: N) -> Self {
        Self {
            id: id.into(),
            fetcher,
            state,
            notifier,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            state_path: None,
            announce_existing: false,
        }
    }

    /// Sets the interval between cycles, never below [`MIN_POLL_INTERVAL_SECS`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_secs(MIN_POLL_INTERVAL_SECS));
        self
    }

    /// Saves state to `path` after every cycle that changes it.
    #[must_use]
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Announces items already in the feed on its first fetch.
    #[must_use]
    pub const fn with_announce_existing(mut self, announce: bool) -> Self {
        self.announce_existing = announce;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn state(&self) -> &FeedState {
        &self.state
    }

    /// Runs the poll loop until shutdown.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SchedulerMessage>) {
        info!(
            feed = %self.id,
            url = %self.fetcher.url(),
            "Poller started, interval {:?}",
            self.poll_interval
        );

        let mut poll_timer = interval(self.poll_interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll_timer.tick() => {
                    self.poll_once().await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::TriggerUpdate) => {
                            debug!(feed = %self.id, "Received trigger update message");
                            self.poll_once().await;
                            poll_timer.reset();
                        }
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!(feed = %self.id, "Poller shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Spawns the poll loop on the runtime.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let (tx, rx) = mpsc::channel(8);
        let id = self.id.clone();
        let task = tokio::spawn(self.run(rx));
        PollerHandle { id, tx, task }
    }

    /// Runs one fetch-diff-publish cycle.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let items = match self.fetcher.fetch_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!(feed = %self.id, error = %e, "Fetch failed, skipping cycle");
                return CycleOutcome::FetchFailed;
            }
        };
        let fetched = items.len();

        let outcome = if !self.state.is_primed() && !self.announce_existing {
            self.state.prime(&items);
            info!(
                feed = %self.id,
                "First fetch: {} existing items recorded as seen",
                fetched
            );
            CycleOutcome::Primed { fetched }
        } else {
            self.state.mark_primed();
            self.deliver(&items).await
        };

        if outcome.changed_state() {
            self.save_state();
        }

        outcome
    }

    async fn deliver(&mut self, items: &[FeedItem]) -> CycleOutcome {
        let fetched = items.len();
        let new_items = self.state.new_items(items);
        if new_items.is_empty() {
            debug!(feed = %self.id, fetched, "No new items");
            return CycleOutcome::Completed {
                fetched,
                delivered: 0,
            };
        }

        info!(feed = %self.id, "{} new item(s)", new_items.len());

        let total = new_items.len();
        for (delivered, item) in new_items.iter().enumerate() {
            match self.notifier.publish(item).await {
                Ok(()) => {
                    self.state.mark_delivered(&item.link);
                    debug!(feed = %self.id, link = %item.link, "Item delivered");
                }
                Err(e) => {
                    error!(
                        feed = %self.id,
                        link = %item.link,
                        error = %e,
                        "Failed to deliver item, will retry next cycle"
                    );
                    return CycleOutcome::Interrupted {
                        delivered,
                        pending: total - delivered,
                    };
                }
            }
        }

        CycleOutcome::Completed {
            fetched,
            delivered: total,
        }
    }

    fn save_state(&self) {
        let Some(path) = &self.state_path else {
            return;
        };

        if let Err(e) = self.state.to_persistent().save(path) {
            warn!(feed = %self.id, path = %path.display(), "Failed to save state: {}", e);
        }
    }
}

impl<N> std::fmt::Debug for FeedPoller<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedPoller")
            .field("id", &self.id)
            .field("poll_interval", &self.poll_interval)
            .field("state_path", &self.state_path)
            .finish_non_exhaustive()
    }
}

/// Handle to a spawned poller task.
#[derive(Debug)]
pub struct PollerHandle {
    id: String,
    tx: mpsc::Sender<SchedulerMessage>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Asks the poller to run a cycle now.
    pub async fn trigger(&self) {
        if self.tx.send(SchedulerMessage::TriggerUpdate).await.is_err() {
            warn!(feed = %self.id, "Poller is no longer running");
        }
    }

    /// Stops the poller and waits for its current cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.tx.send(SchedulerMessage::Shutdown).await;
        if let Err(e) = self.task.await {
            error!(feed = %self.id, "Poller task failed: {}", e);
        }
    }
}
