use std::time::Duration;

use thiserror::Error;

/// Errors reported by a messaging platform collaborator.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform did not answer within its own deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The platform answered but rejected the call.
    #[error("platform API error: {0}")]
    Api(String),

    /// The platform does not offer the requested capability.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A destination string could not be parsed.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PlatformError {
    /// Returns `true` for the distinguishable remote-timeout condition.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns `true` if the error is transient and the call may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguishable() {
        assert!(PlatformError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(!PlatformError::Connection("reset".into()).is_timeout());
        assert!(!PlatformError::Api("retcode 100".into()).is_timeout());
    }

    #[test]
    fn retryable_errors() {
        assert!(PlatformError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(PlatformError::Connection("reset".into()).is_retryable());
        assert!(!PlatformError::Api("x".into()).is_retryable());
        assert!(!PlatformError::Unsupported("x".into()).is_retryable());
        assert!(!PlatformError::InvalidDestination("x".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = PlatformError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "timeout after 500ms");

        let err = PlatformError::InvalidDestination("chan:1".into());
        assert_eq!(err.to_string(), "invalid destination: chan:1");
    }
}
