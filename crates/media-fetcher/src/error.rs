//! Error types for the media fetcher

use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    /// The URL is malformed or does not use http/https
    InvalidUrl(String),
    /// The request did not complete before the configured timeout
    Timeout(Box<reqwest::Error>),
    /// Upstream answered with something other than 200 OK
    Status(u16),
    Http(Box<reqwest::Error>),
    /// The HTTP client could not be built (bad proxy, TLS backend, ...)
    Client(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            FetchError::Timeout(err) => write!(f, "Request timed out: {}", err),
            FetchError::Status(code) => write!(f, "Upstream returned status {}", code),
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::Client(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Timeout(err) | FetchError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(Box::new(err))
        } else {
            FetchError::Http(Box::new(err))
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_error_display() {
        let err = FetchError::InvalidUrl("URL must use HTTP or HTTPS".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid URL: URL must use HTTP or HTTPS"
        );
    }

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status(404);
        assert_eq!(format!("{}", err), "Upstream returned status 404");
    }

    #[test]
    fn test_error_is_debug() {
        let err = FetchError::Client("bad proxy".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Client"));
    }
}
