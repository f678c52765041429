//! File-based media cache
//!
//! Layout inside the cache directory:
//! - `<key>`       payload bytes
//! - `<key>.meta`  content type of the payload
//! - `.<name>.<pid>.<n>.tmp` files being written, renamed into place when complete

use crate::error::{CacheError, Result};
use crate::key::{derive_key, is_key};
use crate::types::{CacheStats, CachedMedia, EntryFile};
use media_fetcher::{FetchedMedia, MediaSource, DEFAULT_CONTENT_TYPE};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub(crate) const META_EXTENSION: &str = "meta";
pub(crate) const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

type InFlightTable = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A media cache storing one payload file per key, filled from a [`MediaSource`]
pub struct MediaCache {
    /// Directory where cached media is stored
    cache_dir: PathBuf,
    /// Where misses are fetched from
    source: Arc<dyn MediaSource>,
    /// Per-key locks for fills in progress
    in_flight: InFlightTable,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Payloads whose deletion fails
    #[cfg(test)]
    pub(crate) undeletable: Mutex<std::collections::HashSet<PathBuf>>,
}

impl MediaCache {
    /// Create a cache over `cache_dir`. Call [`MediaCache::init`] before use.
    pub fn new(cache_dir: impl Into<PathBuf>, source: Arc<dyn MediaSource>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            source,
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            #[cfg(test)]
            undeletable: Mutex::new(Default::default()),
        }
    }

    /// Create and initialize a cache in one step
    pub async fn open(cache_dir: impl Into<PathBuf>, source: Arc<dyn MediaSource>) -> Result<Self> {
        let cache = Self::new(cache_dir, source);
        cache.init().await?;
        Ok(cache)
    }

    /// Ensure the cache directory exists and is writable
    pub async fn init(&self) -> Result<()> {
        let init_err = |source: std::io::Error| CacheError::Init {
            dir: self.cache_dir.clone(),
            source: Box::new(source),
        };

        fs::create_dir_all(&self.cache_dir).await.map_err(init_err)?;

        let probe = self.temp_path("probe");
        fs::write(&probe, b"").await.map_err(init_err)?;
        fs::remove_file(&probe).await.map_err(init_err)?;

        info!(cache_dir = ?self.cache_dir, "Media cache initialized");
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get media for `url`, from disk if cached, otherwise fetched and stored.
    pub async fn get(&self, url: &str, referer: Option<&str>) -> Result<CachedMedia> {
        let key = derive_key(url, referer);

        if let Some(hit) = self.read_entry(&key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit");
            return Ok(hit);
        }

        let slot = InFlight::claim(&self.in_flight, &key);
        let _fill = slot.lock.lock().await;

        // Someone else may have filled it while we waited
        if let Some(hit) = self.read_entry(&key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit after waiting for fill");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, url, "Cache miss");

        let media = self.source.fetch(url, referer).await.map_err(|e| {
            warn!(url, error = %e, "Failed to fetch media");
            e
        })?;

        self.store(&key, &media).await?;

        Ok(CachedMedia {
            data: media.data,
            content_type: media.content_type,
            from_cache: false,
        })
    }

    /// Total size in bytes of all payload files. Sidecars are not counted.
    pub async fn cache_size(&self) -> Result<u64> {
        let entries = self.list_entries().await?;
        Ok(entries.iter().map(|e| e.size).sum())
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.list_entries().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list cache directory");
            Vec::new()
        });

        CacheStats {
            entries: entries.len(),
            total_size: entries.iter().map(|e| e.size).sum(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn payload_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    pub(crate) fn meta_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, META_EXTENSION))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.cache_dir.join(format!(
            ".{}.{}.{}.{}",
            name,
            std::process::id(),
            n,
            TEMP_EXTENSION
        ))
    }

    /// Read a stored entry, sidecar first.
    ///
    /// Sweeps delete the payload before the sidecar, so a sidecar read here
    /// belongs to the payload read next. A payload gone by then is a miss.
    async fn read_entry(&self, key: &str) -> Result<Option<CachedMedia>> {
        let content_type = match fs::read_to_string(self.meta_path(key)).await {
            Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
            Ok(_) => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(key, error = %e, "Failed to read content type sidecar");
                }
                DEFAULT_CONTENT_TYPE.to_string()
            }
        };

        let data = match fs::read(self.payload_path(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(key, error = %e, "Failed to read cached media");
                return Err(e.into());
            }
        };

        Ok(Some(CachedMedia {
            data,
            content_type,
            from_cache: true,
        }))
    }

    /// Persist sidecar, then payload, each via temp file + rename
    async fn store(&self, key: &str, media: &FetchedMedia) -> Result<()> {
        self.write_atomic(&self.meta_path(key), media.content_type.as_bytes())
            .await?;
        self.write_atomic(&self.payload_path(key), &media.data).await?;

        debug!(key, size = media.data.len(), "Cached media");
        Ok(())
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("entry");
        let temp = self.temp_path(name);

        let result = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, path).await
        }
        .await;

        if let Err(e) = result {
            warn!(path = ?path, error = %e, "Failed to write cache file");
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// All payload files currently on disk
    pub(crate) async fn list_entries(&self) -> Result<Vec<EntryFile>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_key(name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) => m,
                // Removed between listing and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            entries.push(EntryFile {
                key: name.to_string(),
                path: entry.path(),
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        Ok(entries)
    }
}

/// Claim on a key's fill lock; drops the table entry when the last claimant leaves
struct InFlight<'a> {
    table: &'a InFlightTable,
    key: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn claim(table: &'a InFlightTable, key: &str) -> Self {
        let lock = lock_table(table)
            .entry(key.to_string())
            .or_default()
            .clone();
        Self {
            table,
            key: key.to_string(),
            lock,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut table = lock_table(self.table);
        // One reference in the table, one here
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.key);
        }
    }
}

fn lock_table(table: &InFlightTable) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
