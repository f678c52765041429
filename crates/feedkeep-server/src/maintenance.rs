//! Media cache maintenance: on-demand and scheduled sweeps

use crate::settings::{CleanupThresholds, SettingsStore};
use file_media_cache::MediaCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Run the age sweep then the size sweep with the configured thresholds.
///
/// Returns the total number of files removed. A failed sweep is logged and
/// counts as zero.
pub async fn run_cleanup(cache: &MediaCache, settings: &dyn SettingsStore) -> usize {
    let thresholds = CleanupThresholds::from_settings(settings);

    let by_age = cache
        .cleanup_old_files(thresholds.max_age_days)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to clean up old media files");
            0
        });

    let by_size = cache
        .cleanup_by_size(thresholds.max_size_mb)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to clean up media files by size");
            0
        });

    let total = by_age + by_size;
    info!(
        removed = total,
        max_age_days = thresholds.max_age_days,
        max_size_mb = thresholds.max_size_mb,
        "Media cache cleanup finished"
    );
    total
}

/// Run [`run_cleanup`] every `every`, starting one period after spawn
pub fn spawn_maintenance(
    cache: Arc<MediaCache>,
    settings: Arc<dyn SettingsStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_cleanup(&cache, settings.as_ref()).await;
        }
    })
}
