//! Error types for the media cache

use media_fetcher::FetchError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CacheError {
    /// Cache directory could not be created or is not writable
    Init {
        dir: PathBuf,
        source: Box<std::io::Error>,
    },
    Io(Box<std::io::Error>),
    Fetch(FetchError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Init { dir, source } => {
                write!(f, "Cache init error for {}: {}", dir.display(), source)
            }
            CacheError::Io(err) => write!(f, "Cache IO error: {}", err),
            CacheError::Fetch(err) => write!(f, "Fetch error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Init { source, .. } => Some(source.as_ref()),
            CacheError::Io(err) => Some(err.as_ref()),
            CacheError::Fetch(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<FetchError> for CacheError {
    fn from(err: FetchError) -> Self {
        CacheError::Fetch(err)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
