//! Commit feed watching
//!
//! - [`FeedSource`]: one fetch of the feed, already parsed into [`FeedItem`]s
//! - [`HttpFeedSource`]: Atom/RSS over HTTP
//! - [`FeedWatcher`]: the polling loop that forwards unseen items, oldest
//!   first, into a bounded channel
//!
//! [`FeedItem`]: crate::types::FeedItem

mod source;
mod watcher;

pub use source::{FeedSource, HttpFeedSource, parse_feed};
pub use watcher::{FeedWatcher, WatcherOptions};
