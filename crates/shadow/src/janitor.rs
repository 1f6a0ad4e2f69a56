//! Periodic eviction of shadow records by age and of cache files by total
//! size.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::config::ConfigHandle;
use crate::error::ShadowError;
use crate::materializer::{is_transient, message_id_hint};
use crate::metrics::GuardMetrics;
use crate::store::SharedStore;

/// What one janitor cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Records removed by the age sweep.
    pub expired: usize,
    /// Files removed by the size sweep.
    pub evicted: usize,
    /// Files actually deleted from disk, across both sweeps.
    pub files_deleted: usize,
    /// Per-file failures that were logged and skipped.
    pub errors: usize,
    /// Cache size seen by the size sweep before eviction.
    pub bytes_before: u64,
    /// Cache size left after eviction.
    pub bytes_after: u64,
}

impl SweepReport {
    /// Whether the cycle changed anything.
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.evicted == 0 && self.files_deleted == 0 && self.errors == 0
    }
}

/// A cache file considered by the size sweep.
#[derive(Debug)]
struct CacheFile {
    path: PathBuf,
    len: u64,
    modified: SystemTime,
}

/// Background task enforcing record lifetime and the cache size cap.
///
/// The interval and cache directory are fixed at construction; lifetime and
/// size cap are read from the live configuration on every sweep.
pub struct Janitor {
    store: SharedStore,
    config: ConfigHandle,
    metrics: Arc<GuardMetrics>,
    cache_dir: PathBuf,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

impl std::fmt::Debug for Janitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Janitor")
            .field("cache_dir", &self.cache_dir)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Janitor {
    /// Create a janitor and the sender that stops it.
    pub fn new(
        store: SharedStore,
        config: ConfigHandle,
        metrics: Arc<GuardMetrics>,
    ) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let snapshot = config.snapshot();
        let janitor = Self {
            cache_dir: snapshot.cache.dir.clone(),
            interval: snapshot.cache.interval.max(Duration::from_secs(1)),
            store,
            config,
            metrics,
            shutdown_rx,
        };
        (janitor, shutdown_tx)
    }

    /// Sweep on every interval tick until a shutdown signal arrives or the
    /// sender is dropped.
    pub async fn run(&mut self) {
        info!(interval_secs = self.interval.as_secs(), "janitor starting");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("janitor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.sweep(Utc::now()).await;
                    if report.is_empty() {
                        debug!("janitor cycle found nothing to evict");
                    } else {
                        info!(
                            expired = report.expired,
                            evicted = report.evicted,
                            files_deleted = report.files_deleted,
                            errors = report.errors,
                            "janitor cycle complete"
                        );
                    }
                }
            }
        }

        info!("janitor stopped");
    }

    /// Run the age sweep and then the size sweep once.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let config = self.config.snapshot();
        let mut report = SweepReport::default();

        let lifetime = chrono::Duration::from_std(config.cache.lifetime)
            .unwrap_or(chrono::Duration::MAX);
        self.sweep_age(now, lifetime, &mut report).await;

        if let Some(cap) = config.cache.max_bytes {
            if let Err(e) = self.sweep_size(cap, &mut report).await {
                warn!(error = %e, "size sweep aborted");
                report.errors += 1;
                self.metrics.increment_sweep_errors();
            }
        }
        report
    }

    async fn sweep_age(
        &self,
        now: DateTime<Utc>,
        lifetime: chrono::Duration,
        report: &mut SweepReport,
    ) {
        let expired = self.store.lock().remove_expired(now, lifetime);
        if expired.is_empty() {
            return;
        }
        report.expired = expired.len();
        self.metrics.add_evicted_by_age(expired.len() as u64);

        for record in &expired {
            debug!(message_id = %record.message_id, "record expired");
            if let Some(path) = record.file_path() {
                self.delete_file(path, report).await;
            }
        }
    }

    async fn sweep_size(&self, cap: u64, report: &mut SweepReport) -> Result<(), ShadowError> {
        let mut files = self.list_files().await?;
        let mut total: u64 = files.iter().map(|f| f.len).sum();
        report.bytes_before = total;
        report.bytes_after = total;
        if total <= cap {
            return Ok(());
        }

        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

        let mut evicted_records = 0;
        for file in files {
            if total <= cap {
                break;
            }
            let removed = {
                let mut store = self.store.lock();
                if store.is_in_flight(&file.path) {
                    None
                } else {
                    let hint = message_id_hint(&file.path).unwrap_or_default();
                    Some(store.remove_backed_by(&hint, &file.path))
                }
            };
            let Some(record) = removed else {
                debug!(path = %file.path.display(), "skipping in-flight file");
                continue;
            };
            if let Some(record) = record {
                debug!(message_id = %record.message_id, "record evicted for size");
                evicted_records += 1;
            }

            report.evicted += 1;
            self.delete_file(&file.path, report).await;
            total = total.saturating_sub(file.len);
        }

        report.bytes_after = total;
        self.metrics.add_evicted_by_size(evicted_records);
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<CacheFile>, ShadowError> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_transient(&path) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "cache entry vanished");
                    continue;
                }
            };
            files.push(CacheFile {
                path,
                len: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(files)
    }

    async fn delete_file(&self, path: &Path, report: &mut SweepReport) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                report.files_deleted += 1;
                self.metrics.increment_files_deleted();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete cache file");
                report.errors += 1;
                self.metrics.increment_sweep_errors();
            }
        }
    }
}
