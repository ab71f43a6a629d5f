//! Feed fetching and new-item tracking.
//!
//! [`FeedFetcher`] pulls an RSS document and yields its items in feed order;
//! [`FeedState`] remembers what was already announced and picks out the
//! items that are new, oldest first.

mod fetcher;
mod item;
mod links;
mod state;

pub use fetcher::{DEFAULT_FETCH_TIMEOUT, FeedFetcher, FetchError, parse_items};
pub use item::FeedItem;
pub use links::LinkList;
pub use state::{FeedState, PersistentState};
