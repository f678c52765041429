use crate::settings;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Environment variables that seed the settings store, and the setting each one sets
const SETTING_VARS: &[(&str, &str)] = &[
    ("MEDIA_CACHE_ENABLED", settings::MEDIA_CACHE_ENABLED),
    ("MEDIA_CACHE_MAX_AGE_DAYS", settings::MEDIA_CACHE_MAX_AGE_DAYS),
    ("MEDIA_CACHE_MAX_SIZE_MB", settings::MEDIA_CACHE_MAX_SIZE_MB),
    ("PROXY_ENABLED", settings::PROXY_ENABLED),
    ("PROXY_TYPE", settings::PROXY_TYPE),
    ("PROXY_HOST", settings::PROXY_HOST),
    ("PROXY_PORT", settings::PROXY_PORT),
    ("PROXY_USERNAME", settings::PROXY_USERNAME),
    ("PROXY_PASSWORD", settings::PROXY_PASSWORD),
];

/// Service configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    /// 0 disables scheduled cache maintenance
    pub maintenance_interval_secs: u64,
    pub refresh_wait_secs: u64,
    pub refresh_concurrency: usize,
    pub feed_parser_url: String,
    pub feed_urls: Vec<String>,
    /// Initial values for the settings store
    pub settings: HashMap<String, String>,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(3001);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./cache/media"));

        let feed_parser_url = lookup("FEED_PARSER_URL")
            .unwrap_or_else(|| "http://localhost:3005".to_string())
            .trim_end_matches('/')
            .to_string();

        let feed_urls: Vec<String> = lookup("FEED_URLS")
            .map(|s| {
                s.split(',')
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut seed = HashMap::new();
        seed.insert(settings::MEDIA_CACHE_ENABLED.to_string(), "true".to_string());
        for (var, name) in SETTING_VARS {
            if let Some(value) = lookup(var) {
                seed.insert(name.to_string(), value);
            }
        }

        Self {
            port,
            cache_dir,
            fetch_timeout_secs: parsed("FETCH_TIMEOUT_SECS").filter(|&s| s > 0).unwrap_or(30),
            maintenance_interval_secs: parsed("MAINTENANCE_INTERVAL_SECS").unwrap_or(60 * 60),
            refresh_wait_secs: parsed("REFRESH_WAIT_SECS").unwrap_or(30),
            refresh_concurrency: parsed("REFRESH_CONCURRENCY")
                .filter(|&n| n > 0)
                .map(|n| n as usize)
                .unwrap_or(4),
            feed_parser_url,
            feed_urls,
            settings: seed,
        }
    }
}
