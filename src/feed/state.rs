//! Per-feed tracking of already announced links.
//!
//! A poll cycle works like this:
//! 1. Fetch the feed (newest first)
//! 2. Cut the list at the watermark: the watermark and everything older go
//!    (a vanished watermark leaves the list whole)
//! 3. Reverse to oldest first
//! 4. Drop links already in the retained history
//! 5. Publish what is left, in order; every success is appended to the
//!    history and becomes the new watermark
//!
//! The very first fetch of a feed with no state only primes it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FeedItem, LinkList};
use crate::config::DEFAULT_HISTORY_LIMIT;

/// Persistent state that survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PersistentState {
    /// Feed URL the state belongs to.
    pub url: String,
    /// Whether the feed has been fetched successfully at least once.
    #[serde(default)]
    pub primed: bool,
    /// Most recently delivered link.
    #[serde(default)]
    pub watermark: Option<String>,
    /// Delivered links, oldest first.
    #[serde(default)]
    pub history: LinkList,
}

impl PersistentState {
    /// Loads state from a JSON file. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Saves state to a JSON file, creating the parent directory if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(tmp, path)
    }
}

/// Retained state of one feed.
#[derive(Debug, Clone)]
pub struct FeedState {
    url: String,
    primed: bool,
    watermark: Option<String>,
    history: LinkList,
    history_limit: usize,
}

impl FeedState {
    /// Creates empty state for the feed at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            primed: false,
            watermark: None,
            history: LinkList::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Bounds the retained history to `limit` links (at least one).
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self.history.keep_last(self.history_limit);
        self
    }

    /// Restores state saved for the same feed.
    ///
    /// State saved for a different URL is ignored and fresh state is returned.
    #[must_use]
    pub fn from_persistent(url: impl Into<String>, persistent: &PersistentState) -> Self {
        let url = url.into();
        if persistent.url != url {
            debug!(
                feed = %url,
                saved = %persistent.url,
                "Saved state belongs to another URL, starting fresh"
            );
            return Self::new(url);
        }

        let mut history = LinkList::new();
        let mut seen = HashSet::new();
        for link in persistent.history.iter() {
            if seen.insert(link) {
                history.push(link);
            }
        }

        let mut state = Self::new(url);
        state.primed = persistent.primed;
        state.watermark.clone_from(&persistent.watermark);
        state.history = history;
        state
    }

    /// Converts to persistent state for saving.
    #[must_use]
    pub fn to_persistent(&self) -> PersistentState {
        PersistentState {
            url: self.url.clone(),
            primed: self.primed,
            watermark: self.watermark.clone(),
            history: self.history.clone(),
        }
    }

    /// Whether the first successful fetch has been recorded.
    #[must_use]
    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    /// Most recently delivered link.
    #[must_use]
    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_deref()
    }

    /// Delivered links, oldest first.
    #[must_use]
    pub const fn history(&self) -> &LinkList {
        &self.history
    }

    /// Links from `oldest_first` that are not in the retained history,
    /// in their original order and without repeats.
    #[must_use]
    pub fn fresh_links(&self, oldest_first: &LinkList) -> LinkList {
        let known: HashSet<&str> = self.history.iter().collect();
        let mut taken = HashSet::new();

        oldest_first
            .iter()
            .filter(|link| !known.contains(link) && taken.insert(*link))
            .map(str::to_owned)
            .collect()
    }

    /// Computes the links to announce from a freshly fetched, newest-first list.
    ///
    /// Returns them oldest first.
    #[must_use]
    pub fn new_links(&self, newest_first: &LinkList) -> LinkList {
        let mut candidates = newest_first.clone();

        if let Some(watermark) = &self.watermark
            && !candidates.remove_older_than(watermark)
        {
            debug!(
                feed = %self.url,
                watermark = %watermark,
                "Watermark no longer in feed, falling back to history"
            );
        }

        candidates.reverse();
        self.fresh_links(&candidates)
    }

    /// Same as [`FeedState::new_links`] but returns the full items.
    #[must_use]
    pub fn new_items(&self, newest_first: &[FeedItem]) -> Vec<FeedItem> {
        let links: LinkList = newest_first.iter().map(|i| i.link.clone()).collect();

        // First occurrence wins if a feed repeats a link.
        let mut by_link: HashMap<&str, &FeedItem> = HashMap::new();
        for item in newest_first {
            by_link.entry(item.link.as_str()).or_insert(item);
        }

        self.new_links(&links)
            .iter()
            .filter_map(|link| by_link.get(link).map(|item| (*item).clone()))
            .collect()
    }

    /// Records everything currently in the feed as seen without announcing it.
    pub fn prime(&mut self, newest_first: &[FeedItem]) {
        for item in newest_first.iter().rev() {
            if !self.history.contains(&item.link) {
                self.history.push(item.link.clone());
            }
        }
        self.history.keep_last(self.history_limit);

        if let Some(newest) = newest_first.first() {
            self.watermark = Some(newest.link.clone());
        }
        self.primed = true;
    }

    /// Marks the state as primed without recording any links.
    pub fn mark_primed(&mut self) {
        self.primed = true;
    }

    /// Records a successful delivery and advances the watermark.
    pub fn mark_delivered(&mut self, link: &str) {
        if !self.history.contains(link) {
            self.history.push(link);
        }
        self.history.keep_last(self.history_limit);
        self.watermark = Some(link.to_owned());
        self.primed = true;
    }
}
