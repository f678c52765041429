use crate::settings::SettingsStore;
use chrono::{DateTime, Utc};
use fetch_coordinator::{FeedItem, FeedRefresher, FetchCoordinator};
use file_media_cache::MediaCache;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MediaCache>,
    pub settings: Arc<dyn SettingsStore>,
    pub coordinator: FetchCoordinator,
    pub refresher: Arc<FeedRefresher>,
    /// Items from the last successful refresh
    pub items: Arc<RwLock<Vec<FeedItem>>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        cache: Arc<MediaCache>,
        settings: Arc<dyn SettingsStore>,
        refresher: Arc<FeedRefresher>,
    ) -> Self {
        Self {
            cache,
            settings,
            coordinator: refresher.coordinator().clone(),
            refresher,
            items: Arc::new(RwLock::new(Vec::new())),
            started_at: Utc::now(),
        }
    }
}
