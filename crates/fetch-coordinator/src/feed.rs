//! Feed types and the collaborators a refresh depends on

use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subscribed feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Output of the feed parser for one feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedFeed {
    #[serde(default)]
    pub title: String,
    /// Site link, used for the favicon fallback
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    /// HTML body or summary
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An aggregated item ready for a reading client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub feed_id: i64,
    pub feed_title: String,
    pub feed_image: Option<String>,
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    /// HTML body as parsed, image URLs untouched
    pub content: Option<String>,
}

/// Turns a feed URL into structured items
#[async_trait]
pub trait FeedParser: Send + Sync {
    async fn parse(&self, feed_url: &str) -> Result<ParsedFeed, SourceError>;
}

/// Supplies the list of subscribed feeds
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn subscriptions(&self) -> Result<Vec<Subscription>, SourceError>;
}
