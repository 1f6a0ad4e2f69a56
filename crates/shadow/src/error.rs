use thiserror::Error;

/// Errors that can occur inside the shadow-cache subsystem.
///
/// None of these are fatal to the host: the handler boundary in
/// [`RecallGuard`](crate::RecallGuard) logs and absorbs them.
#[derive(Debug, Error)]
pub enum ShadowError {
    /// A filesystem operation on the cache directory failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A platform collaborator call failed.
    #[error("platform error: {0}")]
    Platform(#[from] recallguard_platform::PlatformError),

    /// The prompt template failed to compile or render.
    #[error("template error: {0}")]
    Template(String),

    /// The guard was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The event loop is no longer accepting events.
    #[error("event loop closed")]
    Closed,
}

impl From<minijinja::Error> for ShadowError {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}
