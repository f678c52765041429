//! Content-addressed media cache on the local filesystem
//!
//! Media fetched for a `(url, referer)` pair is stored under a SHA-256 derived
//! key with its content type in a sidecar file. Writes go through a temp file
//! and a rename so readers never see partial content. Eviction is done by
//! explicit age and size sweeps; the cache itself runs no timers.

mod cache;
mod error;
mod eviction;
mod key;
mod types;

pub use cache::MediaCache;
pub use error::{CacheError, Result};
pub use key::derive_key;
pub use types::{CacheStats, CachedMedia};
