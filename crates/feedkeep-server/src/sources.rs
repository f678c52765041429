//! Adapters for the feed parser service and the subscription list

use async_trait::async_trait;
use fetch_coordinator::{FeedParser, ParsedFeed, SourceError, Subscription, SubscriptionSource};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client for the feed parser service
pub struct RemoteFeedParser {
    client: Client,
    base_url: String,
}

impl RemoteFeedParser {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_url(&self, feed_url: &str) -> String {
        format!(
            "{}/parse?url={}",
            self.base_url,
            urlencoding::encode(feed_url)
        )
    }
}

#[async_trait]
impl FeedParser for RemoteFeedParser {
    async fn parse(&self, feed_url: &str) -> Result<ParsedFeed, SourceError> {
        let url = self.parse_url(feed_url);
        debug!(feed_url, "Requesting feed parse");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = %e, feed_url, "Feed parser request failed");
            SourceError(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(SourceError(format!(
                "feed parser returned status {}",
                response.status()
            )));
        }

        response
            .json::<ParsedFeed>()
            .await
            .map_err(|e| SourceError(format!("invalid feed parser response: {}", e)))
    }
}

/// Fixed subscription list from configuration
pub struct StaticSubscriptions {
    subscriptions: Vec<Subscription>,
}

impl StaticSubscriptions {
    /// Ids are assigned from 1 in list order
    pub fn from_urls(urls: &[String]) -> Self {
        let subscriptions = urls
            .iter()
            .zip(1..)
            .map(|(url, id)| Subscription {
                id,
                title: url.clone(),
                url: url.clone(),
                category: None,
            })
            .collect();

        Self { subscriptions }
    }
}

#[async_trait]
impl SubscriptionSource for StaticSubscriptions {
    async fn subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        Ok(self.subscriptions.clone())
    }
}
