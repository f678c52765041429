//! Feed fetch coordination
//!
//! Serializes bulk feed refreshes behind a single-flight slot, exposes their
//! progress, and aggregates parsed items for reading clients. Parsing and
//! subscription storage are supplied by the caller through traits.

pub mod coordinator;
pub mod error;
pub mod feed;
pub mod images;
pub mod refresh;
pub mod relative_time;

pub use coordinator::{Busy, FetchCoordinator, FetchProgress, RefreshGuard};
pub use error::{RefreshError, SourceError};
pub use feed::{FeedItem, FeedParser, ParsedFeed, ParsedItem, Subscription, SubscriptionSource};
pub use refresh::{FeedRefresher, RefreshConfig, RefreshReport};
pub use relative_time::{format_published, time_since};
