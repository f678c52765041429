//! Settings lookup and the typed values derived from it

use media_fetcher::{ProxyKind, ProxySettings};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::warn;

pub const MEDIA_CACHE_ENABLED: &str = "media_cache_enabled";
pub const MEDIA_CACHE_MAX_AGE_DAYS: &str = "media_cache_max_age_days";
pub const MEDIA_CACHE_MAX_SIZE_MB: &str = "media_cache_max_size_mb";
pub const PROXY_ENABLED: &str = "proxy_enabled";
pub const PROXY_TYPE: &str = "proxy_type";
pub const PROXY_HOST: &str = "proxy_host";
pub const PROXY_PORT: &str = "proxy_port";
pub const PROXY_USERNAME: &str = "proxy_username";
pub const PROXY_PASSWORD: &str = "proxy_password";

const DEFAULT_MAX_AGE_DAYS: u32 = 7;
const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Key-value settings store queried by name
pub trait SettingsStore: Send + Sync {
    fn get_setting(&self, name: &str) -> Option<String>;
}

/// In-process settings, seeded from configuration
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    #[cfg(test)]
    pub fn set(&self, name: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }
}

impl SettingsStore for MemorySettings {
    fn get_setting(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

pub fn media_cache_enabled(settings: &dyn SettingsStore) -> bool {
    settings.get_setting(MEDIA_CACHE_ENABLED).as_deref() == Some("true")
}

/// Thresholds for the maintenance sweeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupThresholds {
    pub max_age_days: u32,
    pub max_size_mb: u64,
}

impl CleanupThresholds {
    /// Missing, unparsable or zero values fall back to 7 days / 100 MB
    pub fn from_settings(settings: &dyn SettingsStore) -> Self {
        let max_age_days = settings
            .get_setting(MEDIA_CACHE_MAX_AGE_DAYS)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&d| d > 0)
            .unwrap_or(DEFAULT_MAX_AGE_DAYS);

        let max_size_mb = settings
            .get_setting(MEDIA_CACHE_MAX_SIZE_MB)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&mb| mb > 0)
            .unwrap_or(DEFAULT_MAX_SIZE_MB);

        Self {
            max_age_days,
            max_size_mb,
        }
    }
}

/// Proxy to route media fetches through, if enabled and complete
pub fn proxy_settings(settings: &dyn SettingsStore) -> Option<ProxySettings> {
    if settings.get_setting(PROXY_ENABLED).as_deref() != Some("true") {
        return None;
    }

    let kind = settings
        .get_setting(PROXY_TYPE)
        .unwrap_or_else(|| "http".to_string());
    let kind = match kind.parse::<ProxyKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!(error = %e, "Ignoring proxy configuration");
            return None;
        }
    };

    let host = settings
        .get_setting(PROXY_HOST)
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());
    let port = settings
        .get_setting(PROXY_PORT)
        .and_then(|p| p.trim().parse::<u16>().ok());

    let (Some(host), Some(port)) = (host, port) else {
        warn!("Proxy enabled but host or port is missing, ignoring");
        return None;
    };

    Some(ProxySettings {
        kind,
        host,
        port,
        username: settings.get_setting(PROXY_USERNAME).filter(|u| !u.is_empty()),
        password: settings.get_setting(PROXY_PASSWORD).filter(|p| !p.is_empty()),
    })
}
