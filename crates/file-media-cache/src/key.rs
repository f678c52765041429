//! Cache key derivation

use sha2::{Digest, Sha256};

/// Derive the cache key for a media URL and optional referer.
///
/// The URL is length-prefixed before hashing so `("ab", "c")` and
/// `("a", "bc")` hash different inputs. An empty referer is the same as none.
/// The result is 64 lowercase hex chars, safe as a file name.
pub fn derive_key(url: &str, referer: Option<&str>) -> String {
    let referer = referer.unwrap_or("");

    let mut hasher = Sha256::new();
    hasher.update((url.len() as u64).to_be_bytes());
    hasher.update(url.as_bytes());
    hasher.update(referer.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a file name looks like a payload written by this cache
pub(crate) fn is_key(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_is_deterministic() {
        let key1 = derive_key("https://example.com/a.png", Some("https://blog.example.com"));
        let key2 = derive_key("https://example.com/a.png", Some("https://blog.example.com"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_format() {
        let key = derive_key("https://example.com/a.png", None);
        assert_eq!(key.len(), 64);
        assert!(is_key(&key));
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_split_point_does_not_collide() {
        assert_ne!(derive_key("ab", Some("c")), derive_key("a", Some("bc")));
        assert_ne!(derive_key("", Some("abc")), derive_key("abc", None));
    }

    #[test]
    fn test_empty_referer_equals_none() {
        assert_eq!(
            derive_key("https://example.com/a.png", Some("")),
            derive_key("https://example.com/a.png", None)
        );
    }

    #[test]
    fn test_distinct_inputs_yield_distinct_keys() {
        let inputs = [
            ("http://example.com/x.png", None),
            ("https://example.com/x.png", None),
            ("http://example.com/x.png", Some("http://example.com/")),
            ("http://example.com/x.png", Some("http://other.example/")),
            ("http://example.com/x.png?size=2", None),
            ("http://example.com/y.png", None),
        ];

        let keys: HashSet<String> = inputs
            .iter()
            .map(|(url, referer)| derive_key(url, *referer))
            .collect();
        assert_eq!(keys.len(), inputs.len());
    }

    #[test]
    fn test_is_key_rejects_other_files() {
        assert!(!is_key("abc"));
        assert!(!is_key(&format!("{}.meta", "a".repeat(64))));
        assert!(!is_key(&"A".repeat(64)));
    }
}
