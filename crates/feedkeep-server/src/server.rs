//! HTTP server for the media cache and feed endpoints

use crate::routes;
use crate::state::AppState;
use crate::types::HealthResponse;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/media/proxy", get(routes::media::proxy))
        .route("/api/media/cleanup", post(routes::media::cleanup))
        .route("/api/media/info", get(routes::media::info))
        .route("/api/progress", get(routes::feeds::progress))
        .route("/api/feeds/refresh", post(routes::feeds::refresh))
        .route("/api/feeds/items", get(routes::feeds::items))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}
