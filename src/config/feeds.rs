//! Feed list configuration and validation.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::{DEFAULT_FEED_ID, MIN_POLL_INTERVAL_SECS};

/// Errors that can occur during feed configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Feed at index {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Feed at index {index} has invalid id {id:?} (allowed: letters, digits, '-' and '_')")]
    InvalidId { index: usize, id: String },

    #[error("Duplicate feed ID found: {id}")]
    DuplicateId { id: String },

    #[error("Duplicate feed URL found: {url}")]
    DuplicateUrl { url: String },

    #[error("Feed at index {index} (id: {id}) has invalid URL {url:?}: {reason}")]
    InvalidUrl {
        index: usize,
        id: String,
        url: String,
        reason: String,
    },

    #[error("Feed at index {index} (id: {id}) has invalid interval: {interval_secs} seconds (must be >= {min})", min = MIN_POLL_INTERVAL_SECS)]
    InvalidInterval {
        index: usize,
        id: String,
        interval_secs: u64,
    },

    #[error("Feed at index {index} (id: {id}) has an empty chat_id")]
    EmptyChatId { index: usize, id: String },

    #[error("No feeds configured")]
    NoFeeds,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A single RSS feed to watch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    /// Unique identifier, also used as the state file name.
    pub id: String,

    /// URL of the RSS document.
    pub url: String,

    /// Chat that receives this feed's items. Falls back to `TG_CHAT_ID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,

    /// Poll interval override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl FeedSource {
    /// Creates a new feed entry with default chat and interval.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            chat_id: None,
            interval_secs: None,
        }
    }

    /// Poll interval for this feed, falling back to `default`.
    #[must_use]
    pub fn interval_or(&self, default: Duration) -> Duration {
        self.interval_secs.map_or(default, Duration::from_secs)
    }

    /// Chat id for this feed, falling back to `default`.
    #[must_use]
    pub fn chat_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.chat_id.as_deref().unwrap_or(default)
    }

    fn check(&self, index: usize) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId { index });
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidId {
                index,
                id: self.id.clone(),
            });
        }

        let invalid_url = |reason: String| ValidationError::InvalidUrl {
            index,
            id: self.id.clone(),
            url: self.url.clone(),
            reason,
        };

        let parsed = Url::parse(&self.url).map_err(|e| invalid_url(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid_url(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        if let Some(interval_secs) = self.interval_secs
            && interval_secs < MIN_POLL_INTERVAL_SECS
        {
            return Err(ValidationError::InvalidInterval {
                index,
                id: self.id.clone(),
                interval_secs,
            });
        }

        if self.chat_id.as_ref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ValidationError::EmptyChatId {
                index,
                id: self.id.clone(),
            });
        }

        Ok(())
    }
}

/// Configuration containing all feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Feeds to poll.
    pub feeds: Vec<FeedSource>,

    /// If true, items already in a feed on its first poll are announced too.
    /// By default the first poll only records them as seen.
    #[serde(default)]
    pub announce_existing: bool,
}

impl FeedsConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ValidationError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Builds a single-feed configuration from `RSS_FEED_URL`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("RSS_FEED_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())?;

        Some(Self {
            feeds: vec![FeedSource::new(DEFAULT_FEED_ID, url.trim())],
            announce_existing: false,
        })
    }

    /// Validates all feeds in the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_all().into_iter().collect::<Result<Vec<()>, _>>()?;
        Ok(())
    }

    /// Returns detailed validation results, one per feed.
    #[must_use]
    pub fn validate_all(&self) -> Vec<Result<(), ValidationError>> {
        if self.feeds.is_empty() {
            return vec![Err(ValidationError::NoFeeds)];
        }

        let mut seen_ids = HashSet::new();
        let mut seen_urls = HashSet::new();

        self.feeds
            .iter()
            .enumerate()
            .map(|(index, feed)| {
                feed.check(index)?;

                if !seen_ids.insert(feed.id.as_str()) {
                    return Err(ValidationError::DuplicateId {
                        id: feed.id.clone(),
                    });
                }

                if !seen_urls.insert(feed.url.as_str()) {
                    return Err(ValidationError::DuplicateUrl {
                        url: feed.url.clone(),
                    });
                }

                Ok(())
            })
            .collect()
    }

    /// Returns the number of feeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Checks if there are no feeds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Creates an example configuration for users to reference.
    #[must_use]
    pub fn example() -> Self {
        Self {
            feeds: vec![
                FeedSource::new("rust-blog", "https://blog.rust-lang.org/feed.xml"),
                FeedSource {
                    id: "hn-frontpage".to_owned(),
                    url: "https://hnrss.org/frontpage".to_owned(),
                    chat_id: Some("@my_news_channel".to_owned()),
                    interval_secs: Some(600),
                },
            ],
            announce_existing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeds_config(feeds: Vec<FeedSource>) -> FeedsConfig {
        FeedsConfig {
            feeds,
            announce_existing: false,
        }
    }

    #[test]
    fn test_example_is_valid() {
        assert!(FeedsConfig::example().validate().is_ok());
    }

    #[test]
    fn test_validation_no_feeds() {
        assert!(matches!(feeds_config(vec![]).validate(), Err(ValidationError::NoFeeds)));
    }

    #[test]
    fn test_validation_duplicate_id() {
        let config = feeds_config(vec![
            FeedSource::new("news", "https://example.com/a.xml"),
            FeedSource::new("news", "https://example.com/b.xml"),
        ]);
        assert!(matches!(config.validate(), Err(ValidationError::DuplicateId { .. })));
    }

    #[test]
    fn test_validation_duplicate_url() {
        let config = feeds_config(vec![
            FeedSource::new("a", "https://example.com/rss"),
            FeedSource::new("b", "https://example.com/rss"),
        ]);
        assert!(matches!(config.validate(), Err(ValidationError::DuplicateUrl { .. })));
    }

    #[test]
    fn test_validation_bad_url() {
        let config = feeds_config(vec![FeedSource::new("news", "not a url")]);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidUrl { .. })));

        let config = feeds_config(vec![FeedSource::new("news", "ftp://example.com/rss")]);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidUrl { .. })));
    }

    #[test]
    fn test_validation_bad_id() {
        let config = feeds_config(vec![FeedSource::new("../etc", "https://example.com/rss")]);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidId { .. })));
    }

    #[test]
    fn test_validation_short_interval() {
        let mut feed = FeedSource::new("news", "https://example.com/rss");
        feed.interval_secs = Some(1);
        assert!(matches!(
            feeds_config(vec![feed]).validate(),
            Err(ValidationError::InvalidInterval { interval_secs: 1, .. })
        ));
    }

    #[test]
    fn test_validate_all_reports_each_feed() {
        let config = feeds_config(vec![
            FeedSource::new("ok", "https://example.com/rss"),
            FeedSource::new("", "https://example.com/other"),
        ]);
        let results = config.validate_all();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ValidationError::EmptyId { index: 1 })));
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{"feeds": [{"id": "news", "url": "https://example.com/rss"}]}"#;
        let config: FeedsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.len(), 1);
        assert!(!config.announce_existing);

        let feed = &config.feeds[0];
        assert_eq!(feed.id, "news");
        assert_eq!(feed.chat_or("@fallback"), "@fallback");
        assert_eq!(feed.interval_or(Duration::from_secs(300)), Duration::from_secs(300));
    }
}
