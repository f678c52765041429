use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use file_media_cache::CacheError;
use media_fetcher::{validate_media_url, FetchError};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::maintenance::run_cleanup;
use crate::settings::media_cache_enabled;
use crate::state::AppState;
use crate::types::{CacheInfoResponse, CleanupResponse};

/// Cached media never changes for a given key
const CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
    referer: Option<String>,
}

/// GET /api/media/proxy?url=&referer=
/// Serves external media through the disk cache.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, AppError> {
    if !media_cache_enabled(state.settings.as_ref()) {
        return Err(AppError::Forbidden("Media cache is disabled".into()));
    }

    let url = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("URL parameter is required".into()))?;

    validate_media_url(&url).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let referer = params.referer.filter(|r| !r.is_empty());
    let media = state
        .cache
        .get(&url, referer.as_deref())
        .await
        .map_err(|e| match e {
            CacheError::Fetch(FetchError::InvalidUrl(msg)) => AppError::BadRequest(msg),
            e => {
                warn!(url = %url, error = %e, "Failed to serve media");
                AppError::Internal(format!("Failed to fetch media: {}", e))
            }
        })?;

    let cache_header = if media.from_cache { "HIT" } else { "MISS" };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.content_type)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header("X-Cache", cache_header)
        .body(Body::from(media.data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// POST /api/media/cleanup
pub async fn cleanup(State(state): State<AppState>) -> Json<CleanupResponse> {
    let files_cleaned = run_cleanup(&state.cache, state.settings.as_ref()).await;
    info!(files_cleaned, "Manual media cache cleanup");

    Json(CleanupResponse {
        success: true,
        files_cleaned,
    })
}

/// GET /api/media/info
pub async fn info(State(state): State<AppState>) -> Result<Json<CacheInfoResponse>, AppError> {
    let bytes = state
        .cache
        .cache_size()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to get cache size: {}", e)))?;

    Ok(Json(CacheInfoResponse {
        cache_size_mb: bytes as f64 / (1024.0 * 1024.0),
    }))
}
