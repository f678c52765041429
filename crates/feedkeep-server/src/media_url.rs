//! Rewriting of external media URLs to go through the local cache

use fetch_coordinator::images::rewrite_image_urls;

/// Path of the media proxy route
pub const MEDIA_PROXY_PATH: &str = "/api/media/proxy";

/// Point `url` at the media proxy, passing `referer` along for hotlink-protected hosts.
///
/// Inline (`data:`, `blob:`), relative and loopback URLs are returned unchanged.
pub fn proxied_media_url(url: &str, referer: Option<&str>) -> String {
    if url.is_empty()
        || url.starts_with("data:")
        || url.starts_with("blob:")
        || url.starts_with('/')
        || url.starts_with("http://localhost")
        || url.starts_with("http://127.0.0.1")
    {
        return url.to_string();
    }

    let mut proxied = format!("{}?url={}", MEDIA_PROXY_PATH, urlencoding::encode(url));
    if let Some(referer) = referer.filter(|r| !r.is_empty()) {
        proxied.push_str("&referer=");
        proxied.push_str(&urlencoding::encode(referer));
    }
    proxied
}

/// Point every `<img src>` in an HTML fragment at the media proxy
pub fn proxy_images_in_html(html: &str, referer: Option<&str>) -> String {
    rewrite_image_urls(html, |src| proxied_media_url(src, referer))
}
