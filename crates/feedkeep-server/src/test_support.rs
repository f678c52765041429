//! Stub collaborators shared by handler and maintenance tests

use crate::settings::{MemorySettings, SettingsStore, MEDIA_CACHE_ENABLED};
use crate::state::AppState;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fetch_coordinator::{
    FeedParser, FeedRefresher, FetchCoordinator, ParsedFeed, ParsedItem, SourceError,
    Subscription, SubscriptionSource,
};
use file_media_cache::MediaCache;
use media_fetcher::{FetchError, FetchedMedia, MediaSource};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct StubSource {
    calls: AtomicUsize,
    fail: bool,
}

impl StubSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for StubSource {
    async fn fetch(&self, url: &str, _referer: Option<&str>) -> media_fetcher::Result<FetchedMedia> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status(404));
        }
        Ok(FetchedMedia {
            data: format!("media:{}", url).into_bytes(),
            content_type: "image/png".to_string(),
        })
    }
}

/// Parses every feed into one dated item with an inline image
pub struct StubParser;

#[async_trait]
impl FeedParser for StubParser {
    async fn parse(&self, feed_url: &str) -> Result<ParsedFeed, SourceError> {
        Ok(ParsedFeed {
            title: format!("Feed {}", feed_url),
            link: Some("https://blog.example".to_string()),
            image_url: None,
            items: vec![ParsedItem {
                title: "First post".to_string(),
                link: Some("https://blog.example/first".to_string()),
                content: Some(r#"<p><img src="https://cdn.example/a.png"></p>"#.to_string()),
                published: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single(),
                image_url: None,
            }],
        })
    }
}

pub struct StubSubscriptions(pub Vec<Subscription>);

#[async_trait]
impl SubscriptionSource for StubSubscriptions {
    async fn subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        Ok(self.0.clone())
    }
}

/// App state over a cache in `dir`, with one subscribed feed and caching enabled
pub async fn test_state(dir: &Path, source: Arc<StubSource>) -> AppState {
    let cache = Arc::new(MediaCache::open(dir, source).await.unwrap());

    let settings = MemorySettings::default();
    settings.set(MEDIA_CACHE_ENABLED, "true");
    let settings: Arc<dyn SettingsStore> = Arc::new(settings);

    let coordinator = FetchCoordinator::with_poll_interval(Duration::from_millis(10));
    let subscriptions = StubSubscriptions(vec![Subscription {
        id: 1,
        title: "Blog".to_string(),
        url: "https://blog.example/feed".to_string(),
        category: None,
    }]);
    let refresher = FeedRefresher::new(coordinator, Arc::new(StubParser), Arc::new(subscriptions));

    AppState::new(cache, settings, Arc::new(refresher))
}
