//! Runtime configuration for the guard and its live-reload handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use recallguard_core::{MonitorPolicy, UserId};
use recallguard_platform::Destination;

use crate::template::DEFAULT_TEMPLATE;

/// How a recalled record is presented to destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardStrategy {
    /// A prompt message followed by a content message, per destination.
    #[default]
    Sequential,
    /// One combined payload per group destination; other destinations are
    /// skipped.
    Merged,
}

/// Forwarding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardConfig {
    /// Where recalled content is delivered.
    pub destinations: Vec<Destination>,
    /// Presentation strategy.
    pub strategy: ForwardStrategy,
    /// MiniJinja prompt template.
    pub template: String,
    /// Identity used for merged-forward nodes.
    pub bot_id: UserId,
    /// Display name used for merged-forward nodes.
    pub bot_name: String,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            strategy: ForwardStrategy::default(),
            template: DEFAULT_TEMPLATE.to_owned(),
            bot_id: UserId::new("0"),
            bot_name: "RecallGuard".to_owned(),
        }
    }
}

/// Cache directory and janitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding materialized files.
    pub dir: PathBuf,
    /// How often the janitor runs (read once at start).
    pub interval: Duration,
    /// Maximum record age before eviction.
    pub lifetime: Duration,
    /// Maximum aggregate size of the cache directory; `None` disables the
    /// size sweep.
    pub max_bytes: Option<u64>,
    /// Delete leftover files from a previous run at start.
    pub purge_on_start: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("recallguard-cache"),
            interval: Duration::from_secs(600),
            lifetime: Duration::from_secs(86_400),
            max_bytes: None,
            purge_on_start: true,
        }
    }
}

/// Full configuration read by the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardConfig {
    /// Who and what is shadowed.
    pub policy: MonitorPolicy,
    /// Where and how recalls are forwarded.
    pub forward: ForwardConfig,
    /// Cache and janitor settings.
    pub cache: CacheConfig,
}

/// Shared, swappable configuration.
///
/// Readers take a cheap [`snapshot`](Self::snapshot) per event so a reload
/// never tears a single decision.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<GuardConfig>>>,
}

impl ConfigHandle {
    /// Wrap an initial configuration.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The current configuration.
    pub fn snapshot(&self) -> Arc<GuardConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Apply an in-place edit to a copy of the current configuration.
    pub fn update(&self, edit: impl FnOnce(&mut GuardConfig)) {
        let mut guard = self.inner.write();
        let mut next = GuardConfig::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.cache.interval, Duration::from_secs(600));
        assert_eq!(config.cache.lifetime, Duration::from_secs(86_400));
        assert!(config.cache.max_bytes.is_none());
        assert_eq!(config.forward.strategy, ForwardStrategy::Sequential);
        assert!(config.forward.destinations.is_empty());
    }

    #[test]
    fn snapshot_is_stable_across_update() {
        let handle = ConfigHandle::default();
        let before = handle.snapshot();

        handle.update(|c| c.forward.strategy = ForwardStrategy::Merged);

        assert_eq!(before.forward.strategy, ForwardStrategy::Sequential);
        assert_eq!(handle.snapshot().forward.strategy, ForwardStrategy::Merged);
    }

    #[test]
    fn clones_share_state() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        other.update(|c| {
            c.policy.users.insert(UserId::new("42"));
        });
        assert!(handle.snapshot().policy.users.contains("42"));
    }
}
