//! Feed item as seen by the tracker and the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single `<item>` of an RSS channel.
///
/// The link is the dedup key; title and publish date travel along for the
/// notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub link: String,
    pub title: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Creates an item with only a link.
    #[must_use]
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: None,
            published: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Converts an [`rss::Item`]. Returns `None` when the item has no usable link.
    #[must_use]
    pub fn from_rss(item: &rss::Item) -> Option<Self> {
        let link = item.link().map(str::trim).filter(|l| !l.is_empty())?;

        let title = item
            .title()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        // Unparseable dates are dropped rather than failing the item.
        let published = item
            .pub_date()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(Self {
            link: link.to_owned(),
            title,
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rss_full() {
        let mut item = rss::Item::default();
        item.set_link("https://example.com/news/item1".to_owned());
        item.set_title(" Example news title1 ".to_owned());
        item.set_pub_date("Sun, 16 Aug 2020 13:30:00 +0300".to_owned());

        let parsed = FeedItem::from_rss(&item).unwrap();
        assert_eq!(parsed.link, "https://example.com/news/item1");
        assert_eq!(parsed.title.as_deref(), Some("Example news title1"));
        assert_eq!(
            parsed.published.unwrap().to_rfc3339(),
            "2020-08-16T10:30:00+00:00"
        );
    }

    #[test]
    fn test_from_rss_without_link() {
        let mut item = rss::Item::default();
        item.set_title("No link".to_owned());
        assert!(FeedItem::from_rss(&item).is_none());
    }

    #[test]
    fn test_from_rss_bad_date() {
        let mut item = rss::Item::default();
        item.set_link("https://example.com/1".to_owned());
        item.set_pub_date("yesterday".to_owned());

        let parsed = FeedItem::from_rss(&item).unwrap();
        assert!(parsed.published.is_none());
        assert!(parsed.title.is_none());
    }
}
