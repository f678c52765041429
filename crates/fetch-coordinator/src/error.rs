//! Error types for feed refreshes

use crate::coordinator::Busy;
use std::fmt;

/// Failure reported by an external collaborator (parser, subscription store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug)]
pub enum RefreshError {
    /// Another refresh kept the slot past the wait timeout
    Busy(Busy),
    Subscriptions(SourceError),
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshError::Busy(busy) => write!(f, "{}", busy),
            RefreshError::Subscriptions(err) => {
                write!(f, "Failed to load subscriptions: {}", err)
            }
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RefreshError::Busy(busy) => Some(busy),
            RefreshError::Subscriptions(err) => Some(err),
        }
    }
}

impl From<Busy> for RefreshError {
    fn from(busy: Busy) -> Self {
        RefreshError::Busy(busy)
    }
}

impl From<SourceError> for RefreshError {
    fn from(err: SourceError) -> Self {
        RefreshError::Subscriptions(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FetchProgress;

    #[test]
    fn test_busy_error_display() {
        let err = RefreshError::Busy(Busy(FetchProgress {
            total: 10,
            current: 3,
            is_running: true,
        }));
        assert_eq!(format!("{}", err), "Fetch already running (3/10)");
    }

    #[test]
    fn test_subscriptions_error_display() {
        let err: RefreshError = SourceError("store offline".to_string()).into();
        assert_eq!(
            format!("{}", err),
            "Failed to load subscriptions: store offline"
        );
    }
}
