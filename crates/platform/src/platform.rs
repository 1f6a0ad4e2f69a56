use std::path::PathBuf;

use async_trait::async_trait;

use recallguard_core::{ContentKind, OriginId};

use crate::error::PlatformError;
use crate::message::{Destination, ForwardNode, OutboundMessage};

/// Strongly-typed messaging platform trait with native `async fn`.
///
/// This trait is **not** object-safe because it uses native `async fn` methods
/// (which desugar to opaque `impl Future` return types). If you need dynamic
/// dispatch, use [`DynPlatform`] instead -- every `Platform` automatically
/// implements `DynPlatform` via a blanket implementation.
pub trait Platform: Send + Sync {
    /// Returns the unique name of this platform adapter.
    fn name(&self) -> &str;

    /// Resolve an opaque remote file reference to a readable local path.
    ///
    /// Must report a slow endpoint as [`PlatformError::Timeout`] so callers
    /// can tell it apart from other failures.
    fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> impl std::future::Future<Output = Result<PathBuf, PlatformError>> + Send;

    /// Deliver a message to a single destination.
    fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;

    /// Deliver an ordered list of nodes to a group as one combined unit.
    ///
    /// The default implementation reports the capability as unsupported.
    fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send {
        let _ = nodes;
        let group = group.clone();
        async move {
            Err(PlatformError::Unsupported(format!(
                "combined forward to group {group}"
            )))
        }
    }
}

/// Object-safe platform trait for use behind `Arc<dyn DynPlatform>`.
///
/// Uses [`macro@async_trait`] to enable dynamic dispatch of async methods.
/// You generally should not implement this trait directly -- instead implement
/// [`Platform`] and rely on the blanket implementation.
#[async_trait]
pub trait DynPlatform: Send + Sync {
    /// Returns the unique name of this platform adapter.
    fn name(&self) -> &str;

    /// Resolve an opaque remote file reference to a readable local path.
    async fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> Result<PathBuf, PlatformError>;

    /// Deliver a message to a single destination.
    async fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError>;

    /// Deliver an ordered list of nodes to a group as one combined unit.
    async fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> Result<(), PlatformError>;
}

/// Blanket implementation: any type that implements [`Platform`] also
/// implements [`DynPlatform`], bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: Platform + Sync> DynPlatform for T {
    fn name(&self) -> &str {
        Platform::name(self)
    }

    async fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> Result<PathBuf, PlatformError> {
        Platform::fetch_remote_file(self, kind, file_ref).await
    }

    async fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        Platform::send_message(self, destination, message).await
    }

    async fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> Result<(), PlatformError> {
        Platform::send_group_forward(self, group, nodes).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use recallguard_core::UserId;

    use super::*;

    /// A platform that only supports direct messages.
    struct DirectOnly {
        fail: bool,
    }

    impl Platform for DirectOnly {
        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "direct-only"
        }

        async fn fetch_remote_file(
            &self,
            _kind: ContentKind,
            file_ref: &str,
        ) -> Result<PathBuf, PlatformError> {
            if self.fail {
                return Err(PlatformError::Timeout(std::time::Duration::from_secs(1)));
            }
            Ok(PathBuf::from(file_ref))
        }

        async fn send_message(
            &self,
            _destination: &Destination,
            _message: &OutboundMessage,
        ) -> Result<(), PlatformError> {
            if self.fail {
                return Err(PlatformError::Connection("mock failure".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_group_forward_is_unsupported() {
        let platform = DirectOnly { fail: false };
        let nodes = vec![ForwardNode::new(UserId::new("1"), "bot", vec![])];
        let err = Platform::send_group_forward(&platform, &OriginId::new("g"), &nodes)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Unsupported(_)));
    }

    #[tokio::test]
    async fn blanket_dyn_platform_impl() {
        let platform: Arc<dyn DynPlatform> = Arc::new(DirectOnly { fail: false });
        assert_eq!(platform.name(), "direct-only");

        let path = platform
            .fetch_remote_file(ContentKind::Image, "/tmp/a.png")
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/a.png"));

        let dest: Destination = "group:1".parse().unwrap();
        platform
            .send_message(&dest, &OutboundMessage::text("hi"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dyn_platform_propagates_timeout() {
        let platform: Arc<dyn DynPlatform> = Arc::new(DirectOnly { fail: true });
        let err = platform
            .fetch_remote_file(ContentKind::Audio, "x")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
