//! HTTP media fetching

use crate::error::{FetchError, Result};
use crate::proxy::ProxySettings;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Browser-like user agent; several image hosts refuse obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bytes and declared content type of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Anything that can produce media for a (url, referer) pair.
///
/// The cache talks to the network only through this trait.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<FetchedMedia>;
}

/// Configuration for [`MediaFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxySettings>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

/// Check that a media URL is absolute http/https with a host
pub fn validate_media_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl("invalid URL format".into()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(FetchError::InvalidUrl("URL must use HTTP or HTTPS".into()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl("URL has no host".into()));
    }

    Ok(url)
}

/// HTTP client for fetching media from arbitrary hosts
pub struct MediaFetcher {
    client: Client,
}

impl MediaFetcher {
    /// Create a fetcher with default timeout, user agent and no proxy
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent);

        if let Some(proxy) = &config.proxy {
            let proxy_url = proxy.to_url();
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| FetchError::Client(format!("invalid proxy: {}", e)))?;
            debug!(kind = ?config.proxy.as_ref().map(|p| p.kind), "Routing media fetches through proxy");
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MediaSource for MediaFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<FetchedMedia> {
        let url = validate_media_url(url)?;

        debug!(url = %url, referer = ?referer, "Fetching media");

        let mut request = self.client.get(url.clone());
        if let Some(referer) = referer.filter(|r| !r.is_empty()) {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?;

        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), url = %url, "Failed to fetch media");
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let data = response.bytes().await?.to_vec();

        debug!(
            size = data.len(),
            content_type = %content_type,
            "Fetched media"
        );

        Ok(FetchedMedia { data, content_type })
    }
}
