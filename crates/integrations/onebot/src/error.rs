use std::time::Duration;

use recallguard_platform::PlatformError;
use thiserror::Error;

/// Errors specific to the OneBot adapter.
///
/// These are internal errors that get converted into [`PlatformError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum OneBotError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API did not answer within the configured timeout.
    #[error("OneBot API timed out after {0:?}")]
    Timeout(Duration),

    /// The API reported a failed call.
    #[error("OneBot API error: {0}")]
    Api(String),

    /// The API answered with a body that does not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An inbound event report could not be interpreted.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl OneBotError {
    /// Classify a transport error, separating timeouts.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http(err)
        }
    }
}

impl From<OneBotError> for PlatformError {
    fn from(err: OneBotError) -> Self {
        match err {
            OneBotError::Http(e) => PlatformError::Connection(e.to_string()),
            OneBotError::Timeout(d) => PlatformError::Timeout(d),
            OneBotError::Api(msg) => PlatformError::Api(msg),
            OneBotError::InvalidResponse(msg) | OneBotError::InvalidEvent(msg) => {
                PlatformError::Serialization(msg)
            }
        }
    }
}
