//! Media Fetcher
//!
//! Fetches externally hosted media (images, icons, ...) over HTTP with a
//! request timeout, a browser-like user agent, an optional `Referer` for
//! hosts with hotlink protection, and an optional upstream proxy.

pub mod error;
pub mod fetcher;
pub mod proxy;

pub use error::{FetchError, Result};
pub use fetcher::{
    validate_media_url, FetchedMedia, FetcherConfig, MediaFetcher, MediaSource,
    DEFAULT_CONTENT_TYPE, DEFAULT_USER_AGENT,
};
pub use proxy::{ProxyKind, ProxySettings};
