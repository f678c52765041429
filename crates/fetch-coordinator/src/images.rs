//! Image helpers for aggregated items

use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

/// Groups: tag up to the opening quote, the URL, the closing quote
static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*["'])([^"']+)(["'])"#).unwrap()
});

/// The `src` of the first `<img>` tag in an HTML fragment
pub fn first_image_url(html: &str) -> Option<String> {
    let caps = IMG_SRC_RE.captures(html)?;
    Some(caps[2].to_string())
}

/// Replace the `src` of every `<img>` tag with `rewrite(src)`
pub fn rewrite_image_urls(html: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    IMG_SRC_RE
        .replace_all(html, |caps: &Captures| {
            format!("{}{}{}", &caps[1], rewrite(&caps[2]), &caps[3])
        })
        .into_owned()
}

/// Favicon service URL for the host of `site_url`
pub fn favicon_url(site_url: &str) -> Option<String> {
    let url = Url::parse(site_url).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(format!(
        "https://www.google.com/s2/favicons?sz=16&domain={}",
        host
    ))
}
