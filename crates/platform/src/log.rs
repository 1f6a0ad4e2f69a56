use std::path::PathBuf;

use tracing::info;

use recallguard_core::{ContentKind, OriginId};

use crate::error::PlatformError;
use crate::message::{Destination, ForwardNode, OutboundMessage};
use crate::platform::Platform;

/// A platform that logs outbound traffic without performing any external I/O.
///
/// File references are treated as local paths and must already exist.
/// Useful for local development and dry runs where no chat endpoint is
/// available.
pub struct LogPlatform {
    name: String,
}

impl LogPlatform {
    /// Create a new `LogPlatform` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Platform for LogPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::unused_async)]
    async fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> Result<PathBuf, PlatformError> {
        let path = PathBuf::from(file_ref);
        if !path.is_file() {
            return Err(PlatformError::Api(format!(
                "{kind} reference {file_ref} is not a local file"
            )));
        }
        Ok(path)
    }

    #[allow(clippy::unused_async)]
    async fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        info!(
            platform = %self.name,
            destination = %destination,
            segments = message.segments.len(),
            text = %message.plain_text(),
            "log platform delivered message"
        );
        Ok(())
    }

    #[allow(clippy::unused_async)]
    async fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> Result<(), PlatformError> {
        info!(
            platform = %self.name,
            group = %group,
            nodes = nodes.len(),
            "log platform delivered combined forward"
        );
        Ok(())
    }
}
