//! Age and size based eviction sweeps
//!
//! Both sweeps use the payload modification time as the recency signal.
//! Reads never touch files, so this is an approximate LRU. Files still being
//! written live under temp names and are never candidates.

use crate::cache::{MediaCache, META_EXTENSION, TEMP_EXTENSION};
use crate::error::Result;
use crate::key::is_key;
use crate::types::EntryFile;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

const SECS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Temp files and sidecars without a payload younger than this may belong to a fill in progress
const STALE_PARTIAL_SECS: u64 = 60 * 60;

impl MediaCache {
    /// Remove every entry whose age is at least `max_age_days`.
    ///
    /// `0` removes everything. Returns the number of payloads removed;
    /// a file that cannot be deleted is logged and skipped.
    pub async fn cleanup_old_files(&self, max_age_days: u32) -> Result<usize> {
        let max_age = Duration::from_secs(u64::from(max_age_days) * SECS_PER_DAY);
        let now = SystemTime::now();

        let mut removed = 0;
        for entry in self.list_entries().await? {
            if age(now, entry.modified) < max_age {
                continue;
            }
            if self.remove_entry(&entry).await {
                removed += 1;
            }
        }

        self.remove_partials(now, max_age).await?;

        info!(removed, max_age_days, "Media cache age sweep finished");
        Ok(removed)
    }

    /// Remove oldest entries until the payload total is at most `max_size_mb`.
    ///
    /// Returns the number of payloads removed. Nothing is removed when the
    /// cache already fits.
    pub async fn cleanup_by_size(&self, max_size_mb: u64) -> Result<usize> {
        let budget = max_size_mb.saturating_mul(BYTES_PER_MB);
        let mut entries = self.list_entries().await?;
        let mut total: u64 = entries.iter().map(|e| e.size).sum();

        if total <= budget {
            debug!(total, budget, "Media cache within size budget");
            return Ok(0);
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.key.cmp(&b.key)));

        let mut removed = 0;
        for entry in &entries {
            if total <= budget {
                break;
            }
            if self.remove_entry(entry).await {
                total -= entry.size;
                removed += 1;
            }
        }

        info!(removed, total, budget, "Media cache size sweep finished");
        Ok(removed)
    }

    /// Delete a payload and its sidecar. Returns whether the payload was removed.
    async fn remove_entry(&self, entry: &EntryFile) -> bool {
        match self.delete_payload(&entry.path).await {
            Ok(()) => {}
            // Already gone, e.g. a concurrent sweep
            Err(e) if e.kind() == ErrorKind::NotFound => return false,
            Err(e) => {
                warn!(key = %entry.key, error = %e, "Failed to remove cached media");
                return false;
            }
        }

        if let Err(e) = fs::remove_file(self.meta_path(&entry.key)).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(key = %entry.key, error = %e, "Failed to remove content type sidecar");
            }
        }

        debug!(key = %entry.key, size = entry.size, "Evicted cached media");
        true
    }

    async fn delete_payload(&self, path: &Path) -> std::io::Result<()> {
        #[cfg(test)]
        if self
            .undeletable
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(path)
        {
            return Err(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "deletion refused",
            ));
        }

        fs::remove_file(path).await
    }

    /// Reclaim sidecars without a payload and abandoned temp files
    async fn remove_partials(&self, now: SystemTime, max_age: Duration) -> Result<()> {
        let stale = Duration::from_secs(STALE_PARTIAL_SECS);
        let mut dir = fs::read_dir(self.cache_dir()).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            let threshold = if name.starts_with('.') && name.ends_with(TEMP_EXTENSION) {
                stale
            } else if let Some(key) = name
                .strip_suffix(META_EXTENSION)
                .and_then(|s| s.strip_suffix('.'))
                .filter(|k| is_key(k))
            {
                if fs::try_exists(self.payload_path(key)).await.unwrap_or(true) {
                    continue;
                }
                max_age.max(stale)
            } else {
                continue;
            };

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if age(now, modified) < threshold {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => debug!(file = name, "Removed leftover cache file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(file = name, error = %e, "Failed to remove leftover cache file"),
            }
        }

        Ok(())
    }
}

/// Age of a file; modification times in the future count as age zero
fn age(now: SystemTime, modified: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or(Duration::ZERO)
}
