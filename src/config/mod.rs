//! Configuration module for the RSS bot.
//!
//! Handles loading, validation, and management of bot configuration
//! including the feed list, polling timing, and Telegram API credentials.

mod feeds;
mod settings;

pub use feeds::{FeedSource, FeedsConfig, ValidationError};
pub use settings::{BotSettings, ConfigError, TelegramConfig};

/// Default interval between polls of a single feed, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Smallest poll interval a feed may be configured with, in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Default number of delivered links remembered per feed.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Feed id used when the feed list comes from `RSS_FEED_URL`.
pub const DEFAULT_FEED_ID: &str = "default";
