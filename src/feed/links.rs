//! Ordered sequence of item links.

use serde::{Deserialize, Serialize};

/// An ordered list of item links.
///
/// Order is whatever the producer gave it: a freshly fetched list is in
/// feed-native order (newest first), retained history is oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkList(Vec<String>);

impl LinkList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Reverses the list in place.
    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    /// Drops `link` and everything after it, keeping the strict prefix before it.
    ///
    /// Returns `false` and leaves the list untouched when `link` is absent.
    pub fn remove_older_than(&mut self, link: &str) -> bool {
        match self.position(link) {
            Some(pos) => {
                self.0.truncate(pos);
                true
            }
            None => false,
        }
    }

    /// Keeps only the last `max` links.
    pub fn keep_last(&mut self, max: usize) {
        if self.0.len() > max {
            let excess = self.0.len() - max;
            self.0.drain(..excess);
        }
    }

    /// Index of `link`, if present.
    #[must_use]
    pub fn position(&self, link: &str) -> Option<usize> {
        self.0.iter().position(|l| l == link)
    }

    #[must_use]
    pub fn contains(&self, link: &str) -> bool {
        self.position(link).is_some()
    }

    pub fn push(&mut self, link: impl Into<String>) {
        self.0.push(link.into());
    }

    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for LinkList {
    fn from(links: Vec<String>) -> Self {
        Self(links)
    }
}

impl From<Vec<&str>> for LinkList {
    fn from(links: Vec<&str>) -> Self {
        links.into_iter().map(str::to_owned).collect()
    }
}

impl FromIterator<String> for LinkList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for LinkList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
