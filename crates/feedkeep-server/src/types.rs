//! Response bodies for the feedkeep HTTP API

use fetch_coordinator::FeedItem;
use file_media_cache::CacheStats;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub files_cleaned: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheInfoResponse {
    pub cache_size_mb: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshStarted {
    pub started: bool,
}

/// An item as served to reading clients
#[derive(Debug, Serialize)]
pub struct FeedItemView {
    #[serde(flatten)]
    pub item: FeedItem,
    /// e.g. "3 hours ago"; absent for undated items
    pub time_since: Option<String>,
    /// `YYYY-MM-DD HH:MM`
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            cache: CacheStats {
                entries: 100,
                total_size: 50_000_000,
                hits: 500,
                misses: 50,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("3600"));
        assert!(json.contains("\"hits\":500"));
    }

    #[test]
    fn test_cleanup_response_serialization() {
        let json = serde_json::to_string(&CleanupResponse {
            success: true,
            files_cleaned: 4,
        })
        .unwrap();
        assert_eq!(json, r#"{"success":true,"files_cleaned":4}"#);
    }

    #[test]
    fn test_feed_item_view_flattens_item() {
        let view = FeedItemView {
            item: FeedItem {
                feed_id: 1,
                feed_title: "Blog".to_string(),
                feed_image: None,
                title: "Post".to_string(),
                link: None,
                published: None,
                image_url: None,
                content: Some("<p>body</p>".to_string()),
            },
            time_since: Some("2 days ago".to_string()),
            time: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["feed_id"], 1);
        assert_eq!(json["content"], "<p>body</p>");
        assert_eq!(json["time_since"], "2 days ago");
        assert!(json["time"].is_null());
    }

    #[test]
    fn test_cache_info_serialization() {
        let json = serde_json::to_string(&CacheInfoResponse { cache_size_mb: 1.5 }).unwrap();
        assert_eq!(json, r#"{"cache_size_mb":1.5}"#);
    }
}
