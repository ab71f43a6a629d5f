//! Delivery contract between the poller and whatever announces items.

use std::future::Future;

use crate::feed::FeedItem;

/// Sends a new feed item onward.
///
/// A failed publish leaves the item undelivered; the poller retries it on a
/// later cycle while it is still in the feed.
pub trait Notifier: Send + Sync {
    /// Error returned when an item was not delivered.
    type Error: std::error::Error + Send + Sync + 'static;

    fn publish(&self, item: &FeedItem) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
