//! Feedkeep server
//!
//! Aggregates subscribed feeds through a single-flight refresh and serves
//! their external media from a content-addressed disk cache.

mod config;
mod error;
mod maintenance;
mod media_url;
mod routes;
mod server;
mod settings;
mod sources;
mod state;
mod types;

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::maintenance::spawn_maintenance;
use crate::server::start_server;
use crate::settings::{proxy_settings, MemorySettings, SettingsStore};
use crate::sources::{RemoteFeedParser, StaticSubscriptions};
use crate::state::AppState;
use fetch_coordinator::{FeedRefresher, FetchCoordinator, RefreshConfig};
use file_media_cache::MediaCache;
use media_fetcher::{FetcherConfig, MediaFetcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("feedkeep_server=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting feedkeep server...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Feed parser: {}", config.feed_parser_url);
    info!("Subscribed feeds: {}", config.feed_urls.len());

    let settings: Arc<dyn SettingsStore> = Arc::new(MemorySettings::new(config.settings.clone()));
    let timeout = Duration::from_secs(config.fetch_timeout_secs);

    // The proxy is read once; changing it requires a restart
    let proxy = proxy_settings(settings.as_ref());
    if let Some(proxy) = &proxy {
        info!(kind = %proxy.kind, host = %proxy.host, port = proxy.port, "Media fetch proxy enabled");
    }
    let fetcher = MediaFetcher::with_config(FetcherConfig {
        timeout,
        proxy,
        ..FetcherConfig::default()
    })?;

    let cache = Arc::new(MediaCache::open(config.cache_dir.clone(), Arc::new(fetcher)).await?);

    let parser = RemoteFeedParser::new(&config.feed_parser_url, timeout)
        .map_err(|e| ServerError::Config(format!("Feed parser client: {}", e)))?;
    let refresher = FeedRefresher::with_config(
        FetchCoordinator::new(),
        Arc::new(parser),
        Arc::new(StaticSubscriptions::from_urls(&config.feed_urls)),
        RefreshConfig {
            wait_timeout: Duration::from_secs(config.refresh_wait_secs),
            concurrency: config.refresh_concurrency,
        },
    );

    let state = AppState::new(cache.clone(), settings.clone(), Arc::new(refresher));

    if config.maintenance_interval_secs > 0 {
        info!(
            every_secs = config.maintenance_interval_secs,
            "Scheduling media cache maintenance"
        );
        spawn_maintenance(
            cache,
            settings,
            Duration::from_secs(config.maintenance_interval_secs),
        );
    }

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ServerError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
