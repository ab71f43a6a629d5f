//! Feed polling scheduler module.
//!
//! Runs one timer-driven poll loop per feed and hands new items to a
//! [`Notifier`].

mod notifier;
mod runner;

pub use notifier::Notifier;
pub use runner::{CycleOutcome, FeedPoller, PollerHandle, SchedulerMessage};
