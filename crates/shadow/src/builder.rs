use std::sync::Arc;

use recallguard_platform::DynPlatform;

use crate::config::ConfigHandle;
use crate::correlator::RecallCorrelator;
use crate::error::ShadowError;
use crate::event_loop::DEFAULT_QUEUE_CAPACITY;
use crate::forwarder::Forwarder;
use crate::guard::RecallGuard;
use crate::materializer::FileMaterializer;
use crate::metrics::GuardMetrics;
use crate::store::ShadowStore;

/// Fluent builder for constructing a [`RecallGuard`].
///
/// A platform must be supplied. The configuration defaults to
/// [`GuardConfig::default`](crate::GuardConfig::default).
#[derive(Default)]
pub struct RecallGuardBuilder {
    platform: Option<Arc<dyn DynPlatform>>,
    config: Option<ConfigHandle>,
    metrics: Option<Arc<GuardMetrics>>,
    queue_capacity: Option<usize>,
}

impl RecallGuardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the messaging platform.
    #[must_use]
    pub fn platform(mut self, platform: Arc<dyn DynPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the live configuration handle.
    #[must_use]
    pub fn config(mut self, config: ConfigHandle) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing metrics instance.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<GuardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Capacity of each inbound event queue.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Build the guard.
    pub fn build(self) -> Result<RecallGuard, ShadowError> {
        let platform = self
            .platform
            .ok_or_else(|| ShadowError::Configuration("platform is required".into()))?;
        let config = self.config.unwrap_or_default();
        let cache_dir = config.snapshot().cache.dir.clone();
        if cache_dir.as_os_str().is_empty() {
            return Err(ShadowError::Configuration(
                "cache directory must not be empty".into(),
            ));
        }

        let store = ShadowStore::shared();
        let metrics = self.metrics.unwrap_or_default();

        Ok(RecallGuard {
            materializer: FileMaterializer::new(Arc::clone(&platform), cache_dir),
            correlator: RecallCorrelator::new(Arc::clone(&store)),
            forwarder: Forwarder::new(platform, Arc::clone(&metrics)),
            store,
            config,
            metrics,
            queue_capacity: self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use recallguard_platform::LogPlatform;

    use super::*;

    #[test]
    fn build_missing_platform_returns_error() {
        let err = RecallGuardBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("platform is required"));
    }

    #[test]
    fn build_with_platform_succeeds() {
        let guard = RecallGuardBuilder::new()
            .platform(Arc::new(LogPlatform::new("log")))
            .build()
            .unwrap();
        assert_eq!(guard.counts().total(), 0);
    }

    #[test]
    fn build_rejects_empty_cache_dir() {
        let config = ConfigHandle::default();
        config.update(|c| c.cache.dir = std::path::PathBuf::new());
        let result = RecallGuardBuilder::new()
            .platform(Arc::new(LogPlatform::new("log")))
            .config(config)
            .build();
        assert!(matches!(result, Err(ShadowError::Configuration(_))));
    }
}
