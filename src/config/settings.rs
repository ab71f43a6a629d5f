//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};

/// Public Telegram Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram Bot API configuration.
#[derive(Debug)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub bot_token: SecretString,

    /// Chat that receives items from feeds without their own `chat_id`.
    pub chat_id: String,

    /// Base URL of the Bot API.
    pub api_url: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration pointing at the public API.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            chat_id: chat_id.into(),
            api_url: DEFAULT_API_URL.to_owned(),
        }
    }

    /// Overrides the Bot API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_BOT_TOKEN` and `TG_CHAT_ID` to be set. `TG_API_URL`
    /// is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = required_env("TG_BOT_TOKEN")?;
        let chat_id = required_env("TG_CHAT_ID")?;

        let api_url = std::env::var("TG_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        Ok(Self::new(bot_token, chat_id).with_api_url(api_url))
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyEnvVar(name));
    }
    Ok(value)
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Path to the feeds JSON file.
    pub feeds_path: PathBuf,

    /// Default interval between polls of one feed in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Timeout for a single feed fetch in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Minimum interval between outgoing messages in milliseconds.
    #[serde(default = "default_min_send_interval")]
    pub min_send_interval_ms: u64,

    /// Number of delivered links remembered per feed.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Directory for per-feed state files. `None` keeps state in memory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Send messages without a notification sound.
    #[serde(default)]
    pub silent_messages: bool,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_feeds_path() -> PathBuf {
    PathBuf::from("feeds.json")
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_min_send_interval() -> u64 {
    1000 // Telegram allows roughly one message per second per chat
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            feeds_path: default_feeds_path(),
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            min_send_interval_ms: default_min_send_interval(),
            history_limit: default_history_limit(),
            state_dir: None,
            silent_messages: false,
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates bot settings from any variable source, e.g. a map in tests.
    ///
    /// Unparseable values fall back to their defaults. A poll interval below
    /// [`MIN_POLL_INTERVAL_SECS`] is raised to it and a zero fetch timeout
    /// falls back to the default, both with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let mut poll_interval_secs =
            parse_var(&lookup, "POLL_INTERVAL").unwrap_or_else(default_poll_interval);
        if poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            warn!(
                "POLL_INTERVAL={}s is below the minimum, using {}s",
                poll_interval_secs, MIN_POLL_INTERVAL_SECS
            );
            poll_interval_secs = MIN_POLL_INTERVAL_SECS;
        }

        let mut fetch_timeout_secs =
            parse_var(&lookup, "FETCH_TIMEOUT").unwrap_or_else(default_fetch_timeout);
        if fetch_timeout_secs == 0 {
            warn!(
                "FETCH_TIMEOUT=0 would fail every fetch, using {}s",
                default_fetch_timeout()
            );
            fetch_timeout_secs = default_fetch_timeout();
        }

        Self {
            feeds_path: non_empty("FEEDS_PATH").map_or_else(default_feeds_path, PathBuf::from),
            poll_interval_secs,
            fetch_timeout_secs,
            min_send_interval_ms: parse_var(&lookup, "MIN_SEND_INTERVAL_MS")
                .unwrap_or_else(default_min_send_interval),
            history_limit: parse_var(&lookup, "HISTORY_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or_else(default_history_limit),
            state_dir: non_empty("STATE_DIR").map(PathBuf::from),
            silent_messages: lookup("SILENT_MESSAGES")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
            log_level: non_empty("RUST_LOG").unwrap_or_else(default_log_level),
        }
    }

    /// Default poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Minimum interval between sends as a [`Duration`].
    #[must_use]
    pub const fn min_send_interval(&self) -> Duration {
        Duration::from_millis(self.min_send_interval_ms)
    }

    /// Path of the state file for the feed with the given id, if persistence is enabled.
    #[must_use]
    pub fn state_path(&self, feed_id: &str) -> Option<PathBuf> {
        self.state_dir
            .as_ref()
            .map(|dir| dir.join(format!("{feed_id}.json")))
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    lookup(name).and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Environment variable {0} is set but empty")]
    EmptyEnvVar(&'static str),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn settings_from(vars: &[(&str, &str)]) -> BotSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        BotSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let settings = settings_from(&[]);
        assert_eq!(settings.poll_interval(), Duration::from_secs(300));
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(settings.history_limit, 200);
        assert!(!settings.silent_messages);
    }

    #[test]
    fn test_zero_poll_interval_raised_to_minimum() {
        let settings = settings_from(&[("POLL_INTERVAL", "0")]);
        assert_eq!(
            settings.poll_interval(),
            Duration::from_secs(MIN_POLL_INTERVAL_SECS)
        );

        let settings = settings_from(&[("POLL_INTERVAL", "3")]);
        assert_eq!(settings.poll_interval_secs, MIN_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_zero_fetch_timeout_uses_default() {
        let settings = settings_from(&[("FETCH_TIMEOUT", "0")]);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let settings = settings_from(&[
            ("POLL_INTERVAL", " 60 "),
            ("HISTORY_LIMIT", "0"),
            ("STATE_DIR", "/tmp/rssbot"),
            ("SILENT_MESSAGES", "true"),
            ("MIN_SEND_INTERVAL_MS", "not a number"),
        ]);
        assert_eq!(settings.poll_interval_secs, 60);
        assert_eq!(settings.history_limit, 200);
        assert_eq!(settings.state_dir, Some(PathBuf::from("/tmp/rssbot")));
        assert!(settings.silent_messages);
        assert_eq!(settings.min_send_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.feeds_path, PathBuf::from("feeds.json"));
        assert_eq!(settings.poll_interval_secs, 300);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(settings.min_send_interval(), Duration::from_secs(1));
        assert!(settings.state_dir.is_none());
    }

    #[test]
    fn test_state_path_requires_state_dir() {
        let mut settings = BotSettings::default();
        assert!(settings.state_path("news").is_none());

        settings.state_dir = Some(PathBuf::from("/var/lib/rssbot"));
        assert_eq!(
            settings.state_path("news"),
            Some(PathBuf::from("/var/lib/rssbot/news.json"))
        );
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new("123456-aaaaaaa", "@test_chat");
        assert_eq!(config.bot_token.expose_secret(), "123456-aaaaaaa");
        assert_eq!(config.chat_id, "@test_chat");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_telegram_config_debug_hides_token() {
        let config = TelegramConfig::new("123456-aaaaaaa", "@test_chat");
        let debug = format!("{config:?}");
        assert!(!debug.contains("123456-aaaaaaa"));
    }
}
