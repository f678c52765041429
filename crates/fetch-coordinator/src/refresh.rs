//! Bulk feed refresh driven through the coordinator

use crate::coordinator::FetchCoordinator;
use crate::error::RefreshError;
use crate::feed::{FeedItem, FeedParser, ParsedFeed, Subscription, SubscriptionSource};
use crate::images::{favicon_url, first_image_url};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tuning for [`FeedRefresher`]
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// How long to wait for a running refresh before giving up
    pub wait_timeout: Duration,
    /// Feeds parsed at the same time
    pub concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            concurrency: 4,
        }
    }
}

/// Outcome of one refresh
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub feeds_total: usize,
    pub feeds_failed: usize,
    /// Newest first; undated items last
    pub items: Vec<FeedItem>,
}

pub struct FeedRefresher {
    coordinator: FetchCoordinator,
    parser: Arc<dyn FeedParser>,
    subscriptions: Arc<dyn SubscriptionSource>,
    config: RefreshConfig,
}

impl FeedRefresher {
    pub fn new(
        coordinator: FetchCoordinator,
        parser: Arc<dyn FeedParser>,
        subscriptions: Arc<dyn SubscriptionSource>,
    ) -> Self {
        Self::with_config(coordinator, parser, subscriptions, RefreshConfig::default())
    }

    pub fn with_config(
        coordinator: FetchCoordinator,
        parser: Arc<dyn FeedParser>,
        subscriptions: Arc<dyn SubscriptionSource>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            coordinator,
            parser,
            subscriptions,
            config,
        }
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    /// Refresh every subscription
    pub async fn refresh_all(&self) -> Result<RefreshReport, RefreshError> {
        let subscriptions = self.subscriptions.subscriptions().await?;
        self.refresh(subscriptions).await
    }

    /// Refresh only the subscriptions with the given ids
    pub async fn refresh_by_ids(&self, ids: &[i64]) -> Result<RefreshReport, RefreshError> {
        let subscriptions: Vec<Subscription> = self
            .subscriptions
            .subscriptions()
            .await?
            .into_iter()
            .filter(|s| ids.contains(&s.id))
            .collect();

        if subscriptions.is_empty() {
            return Ok(RefreshReport::default());
        }

        self.refresh(subscriptions).await
    }

    async fn refresh(&self, subscriptions: Vec<Subscription>) -> Result<RefreshReport, RefreshError> {
        let guard = self
            .coordinator
            .start_when_idle(subscriptions.len(), self.config.wait_timeout)
            .await?;

        let feeds_total = subscriptions.len();
        info!(feeds = feeds_total, "Refreshing feeds");

        let parser = &self.parser;
        let results = stream::iter(subscriptions)
            .map(|sub| async move {
                let result = parser.parse(&sub.url).await;
                (sub, result)
            })
            .buffer_unordered(self.config.concurrency.max(1));
        let mut results = std::pin::pin!(results);

        let mut report = RefreshReport {
            feeds_total,
            ..RefreshReport::default()
        };

        while let Some((sub, result)) = results.next().await {
            match result {
                Ok(feed) => report.items.extend(collect_items(&sub, feed)),
                Err(e) => {
                    warn!(feed_id = sub.id, url = %sub.url, error = %e, "Failed to refresh feed");
                    report.feeds_failed += 1;
                }
            }
            guard.advance();
        }

        report.items.sort_by(|a, b| b.published.cmp(&a.published));
        guard.finish();

        info!(
            feeds = report.feeds_total,
            failed = report.feeds_failed,
            items = report.items.len(),
            "Feed refresh finished"
        );
        Ok(report)
    }
}

fn collect_items(sub: &Subscription, feed: ParsedFeed) -> Vec<FeedItem> {
    let feed_title = if feed.title.is_empty() {
        sub.title.clone()
    } else {
        feed.title
    };
    let feed_image = feed
        .image_url
        .or_else(|| favicon_url(feed.link.as_deref().unwrap_or(&sub.url)));

    feed.items
        .into_iter()
        .map(|item| FeedItem {
            feed_id: sub.id,
            feed_title: feed_title.clone(),
            feed_image: feed_image.clone(),
            image_url: item
                .image_url
                .or_else(|| item.content.as_deref().and_then(first_image_url)),
            title: item.title,
            link: item.link,
            published: item.published,
            content: item.content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::feed::ParsedItem;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct StubParser {
        feeds: HashMap<String, ParsedFeed>,
        delay: Duration,
    }

    #[async_trait]
    impl FeedParser for StubParser {
        async fn parse(&self, feed_url: &str) -> Result<ParsedFeed, SourceError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.feeds
                .get(feed_url)
                .cloned()
                .ok_or_else(|| SourceError(format!("cannot parse {}", feed_url)))
        }
    }

    struct StubSubscriptions(Vec<Subscription>);

    #[async_trait]
    impl SubscriptionSource for StubSubscriptions {
        async fn subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn sub(id: i64, url: &str) -> Subscription {
        Subscription {
            id,
            title: format!("Feed {}", id),
            url: url.to_string(),
            category: None,
        }
    }

    fn item(title: &str, day: Option<u32>) -> ParsedItem {
        ParsedItem {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title)),
            content: None,
            published: day.map(|d| Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap()),
            image_url: None,
        }
    }

    fn refresher(delay: Duration) -> FeedRefresher {
        let mut feeds = HashMap::new();
        feeds.insert(
            "https://a.example/feed".to_string(),
            ParsedFeed {
                title: "A".to_string(),
                link: Some("https://a.example".to_string()),
                image_url: None,
                items: vec![item("a-old", Some(1)), item("a-undated", None)],
            },
        );
        feeds.insert(
            "https://b.example/feed".to_string(),
            ParsedFeed {
                title: String::new(),
                link: None,
                image_url: Some("https://b.example/logo.png".to_string()),
                items: vec![
                    item("b-new", Some(9)),
                    ParsedItem {
                        content: Some(r#"<p><img src="https://b.example/pic.jpg"></p>"#.to_string()),
                        ..item("b-mid", Some(5))
                    },
                ],
            },
        );

        let subscriptions = vec![
            sub(1, "https://a.example/feed"),
            sub(2, "https://b.example/feed"),
            sub(3, "https://broken.example/feed"),
        ];

        FeedRefresher::with_config(
            FetchCoordinator::with_poll_interval(Duration::from_millis(10)),
            Arc::new(StubParser { feeds, delay }),
            Arc::new(StubSubscriptions(subscriptions)),
            RefreshConfig {
                wait_timeout: Duration::from_millis(200),
                concurrency: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_refresh_all_aggregates_and_sorts_items() {
        let refresher = refresher(Duration::ZERO);
        let report = refresher.refresh_all().await.unwrap();

        assert_eq!(report.feeds_total, 3);
        assert_eq!(report.feeds_failed, 1);

        let titles: Vec<&str> = report.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b-new", "b-mid", "a-old", "a-undated"]);

        let progress = refresher.coordinator().progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.current, 3);
        assert!(!progress.is_running);
    }

    #[tokio::test]
    async fn test_refresh_fills_image_fallbacks() {
        let refresher = refresher(Duration::ZERO);
        let report = refresher.refresh_all().await.unwrap();

        let a_old = report.items.iter().find(|i| i.title == "a-old").unwrap();
        assert_eq!(a_old.feed_title, "A");
        assert_eq!(
            a_old.feed_image.as_deref(),
            Some("https://www.google.com/s2/favicons?sz=16&domain=a.example")
        );
        assert!(a_old.image_url.is_none());

        let b_mid = report.items.iter().find(|i| i.title == "b-mid").unwrap();
        assert_eq!(b_mid.feed_title, "Feed 2");
        assert_eq!(b_mid.feed_image.as_deref(), Some("https://b.example/logo.png"));
        assert_eq!(b_mid.image_url.as_deref(), Some("https://b.example/pic.jpg"));
        assert_eq!(
            b_mid.content.as_deref(),
            Some(r#"<p><img src="https://b.example/pic.jpg"></p>"#)
        );
    }

    #[tokio::test]
    async fn test_refresh_by_ids_filters_subscriptions() {
        let refresher = refresher(Duration::ZERO);
        let report = refresher.refresh_by_ids(&[2]).await.unwrap();

        assert_eq!(report.feeds_total, 1);
        assert_eq!(report.feeds_failed, 0);
        assert!(report.items.iter().all(|i| i.feed_id == 2));
        assert_eq!(refresher.coordinator().progress().total, 1);
    }

    #[tokio::test]
    async fn test_refresh_by_unknown_ids_does_not_touch_progress() {
        let refresher = refresher(Duration::ZERO);
        let report = refresher.refresh_by_ids(&[42]).await.unwrap();

        assert_eq!(report.feeds_total, 0);
        assert_eq!(
            refresher.coordinator().progress(),
            crate::coordinator::FetchProgress::default()
        );
    }

    #[tokio::test]
    async fn test_refresh_reports_running_progress() {
        let refresher = Arc::new(refresher(Duration::from_millis(100)));

        let running = refresher.clone();
        let handle = tokio::spawn(async move { running.refresh_all().await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        let progress = refresher.coordinator().progress();
        assert!(progress.is_running);
        assert_eq!(progress.total, 3);

        handle.await.unwrap().unwrap();
        assert!(!refresher.coordinator().progress().is_running);
    }

    #[tokio::test]
    async fn test_refresh_while_busy_times_out() {
        let refresher = refresher(Duration::ZERO);
        let _guard = refresher.coordinator().start_operation(9).unwrap();

        let result = refresher.refresh_all().await;
        assert!(matches!(result, Err(RefreshError::Busy(_))));
        assert_eq!(refresher.coordinator().progress().total, 9);
    }
}
