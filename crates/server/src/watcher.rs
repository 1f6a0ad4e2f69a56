//! File watcher for configuration hot-reload.
//!
//! [`ConfigWatcher`] monitors the TOML file for changes and swaps the new
//! monitor and forward sections into the running guard's [`ConfigHandle`],
//! together with the cache lifetime and size cap. Cache directory and
//! janitor interval are fixed at startup; changes to them are logged and
//! otherwise ignored until the next restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use recallguard_shadow::ConfigHandle;

use crate::config::RecallGuardConfig;
use crate::error::ServerError;

/// Default debounce interval for filesystem change events.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What a successful reload changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// The cache directory or janitor interval differ from the running ones.
    pub restart_required: bool,
}

/// Watches the config file and hot-reloads the live sections.
pub struct ConfigWatcher {
    handle: ConfigHandle,
    config_path: PathBuf,
    debounce: Duration,
}

impl ConfigWatcher {
    /// Create a watcher that reloads `config_path` into `handle`.
    pub fn new(handle: ConfigHandle, config_path: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            config_path: config_path.into(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Spawn the watcher as a background tokio task.
    ///
    /// The watcher runs until the returned handle is aborted or the process
    /// exits.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(error = %e, "config watcher exited with error");
            }
        })
    }

    async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(16);

        // Editors often replace the file atomically, so watch the directory.
        let watch_dir = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self
            .config_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();

        let _watcher = {
            let mut watcher = RecommendedWatcher::new(
                move |res: Result<notify::Event, notify::Error>| match res {
                    Ok(event) => {
                        let ours = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().is_some_and(|n| n == file_name.as_os_str()));
                        if is_relevant_event(event.kind) && ours {
                            // A full channel already has a reload pending.
                            let _ = tx.try_send(());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "filesystem watcher error");
                    }
                },
                notify::Config::default(),
            )?;
            watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
            info!(path = %self.config_path.display(), "config watcher started");
            watcher
        };

        loop {
            if rx.recv().await.is_none() {
                debug!("config watcher channel closed, shutting down");
                break;
            }

            tokio::time::sleep(self.debounce).await;
            while rx.try_recv().is_ok() {}

            self.reload();
        }

        Ok(())
    }

    fn reload(&self) {
        info!(path = %self.config_path.display(), "reloading config");
        match reload_from_file(&self.handle, &self.config_path) {
            Ok(outcome) => {
                if outcome.restart_required {
                    warn!("cache dir or interval changed, restart required to apply");
                }
                info!("config reloaded");
            }
            Err(e) => {
                error!(error = %e, "failed to reload config, keeping previous state");
            }
        }
    }
}

/// Read `path` and apply it to `handle`.
pub fn reload_from_file(handle: &ConfigHandle, path: &Path) -> Result<ReloadOutcome, ServerError> {
    let contents = std::fs::read_to_string(path)?;
    apply_reload(handle, &contents)
}

/// Parse `contents` and swap the live sections into `handle`.
///
/// Nothing is applied unless the whole document parses and validates.
pub fn apply_reload(handle: &ConfigHandle, contents: &str) -> Result<ReloadOutcome, ServerError> {
    let fresh = RecallGuardConfig::from_toml(contents)?.to_guard_config()?;

    let current = handle.snapshot();
    let restart_required =
        current.cache.dir != fresh.cache.dir || current.cache.interval != fresh.cache.interval;

    handle.update(|config| {
        config.policy = fresh.policy;
        config.forward = fresh.forward;
        config.cache.lifetime = fresh.cache.lifetime;
        config.cache.max_bytes = fresh.cache.max_bytes;
    });

    Ok(ReloadOutcome { restart_required })
}

/// Returns `true` for filesystem events that might indicate config changes.
fn is_relevant_event(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
