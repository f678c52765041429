use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use fetch_coordinator::{format_published, time_since, FetchProgress};
use serde_json::json;
use tracing::{info, warn};

use crate::media_url::{proxied_media_url, proxy_images_in_html};
use crate::settings::media_cache_enabled;
use crate::state::AppState;
use crate::types::{FeedItemView, RefreshStarted};

/// GET /api/progress
pub async fn progress(State(state): State<AppState>) -> Json<FetchProgress> {
    Json(state.coordinator.progress())
}

/// POST /api/feeds/refresh
/// Starts a refresh of every subscription in the background.
pub async fn refresh(State(state): State<AppState>) -> Response {
    let progress = state.coordinator.progress();
    if progress.is_running {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "A refresh is already running",
                "progress": progress,
            })),
        )
            .into_response();
    }

    let refresher = state.refresher.clone();
    let items = state.items.clone();
    tokio::spawn(async move {
        match refresher.refresh_all().await {
            Ok(report) => {
                // Keep the previous items if every feed failed
                if report.feeds_total == 0 || report.feeds_failed < report.feeds_total {
                    info!(
                        feeds = report.feeds_total,
                        failed = report.feeds_failed,
                        items = report.items.len(),
                        "Stored refreshed items"
                    );
                    *items.write().await = report.items;
                } else {
                    warn!(feeds = report.feeds_total, "Every feed failed to refresh");
                }
            }
            Err(e) => warn!(error = %e, "Feed refresh did not run"),
        }
    });

    (StatusCode::ACCEPTED, Json(RefreshStarted { started: true })).into_response()
}

/// GET /api/feeds/items
pub async fn items(State(state): State<AppState>) -> Json<Vec<FeedItemView>> {
    let items = state.items.read().await.clone();
    let proxy_media = media_cache_enabled(state.settings.as_ref());
    let now = Utc::now();

    let views = items
        .into_iter()
        .map(|mut item| {
            if proxy_media {
                let referer = item.link.as_deref();
                item.image_url = item
                    .image_url
                    .as_deref()
                    .map(|url| proxied_media_url(url, referer));
                item.content = item
                    .content
                    .as_deref()
                    .map(|html| proxy_images_in_html(html, referer));
                item.feed_image = item
                    .feed_image
                    .as_deref()
                    .map(|url| proxied_media_url(url, None));
            }

            FeedItemView {
                time_since: item.published.map(|p| time_since(p, now)),
                time: item.published.map(format_published),
                item,
            }
        })
        .collect();

    Json(views)
}
