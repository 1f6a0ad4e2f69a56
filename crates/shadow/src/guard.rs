//! The shadow-cache service and its running form.
//!
//! [`RecallGuard`] owns the store and its collaborators and exposes the two
//! event handlers. [`GuardRuntime`] adds the janitor and the event loop as
//! background tasks and tears both down on shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use recallguard_core::{
    Component, ContentKind, InboundMessage, PlatformEvent, RecallNotice, ShadowRecord,
};

use crate::config::ConfigHandle;
use crate::correlator::RecallCorrelator;
use crate::error::ShadowError;
use crate::event_loop::{EventLoop, EventSender};
use crate::forwarder::{ForwardReport, Forwarder};
use crate::janitor::Janitor;
use crate::materializer::{FileMaterializer, discard_file};
use crate::metrics::GuardMetrics;
use crate::store::{KindCounts, SharedStore};

/// Shadows monitored messages and forwards them when recalled.
///
/// Construct with [`RecallGuardBuilder`](crate::RecallGuardBuilder).
pub struct RecallGuard {
    pub(crate) store: SharedStore,
    pub(crate) config: ConfigHandle,
    pub(crate) materializer: FileMaterializer,
    pub(crate) correlator: RecallCorrelator,
    pub(crate) forwarder: Forwarder,
    pub(crate) metrics: Arc<GuardMetrics>,
    pub(crate) queue_capacity: usize,
}

impl std::fmt::Debug for RecallGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecallGuard")
            .field("materializer", &self.materializer)
            .field("forwarder", &self.forwarder)
            .field("counts", &self.counts())
            .finish_non_exhaustive()
    }
}

impl RecallGuard {
    /// Dispatch a platform event to the matching handler.
    pub async fn handle_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Message(message) => {
                self.handle_message(message).await;
            }
            PlatformEvent::Recall(notice) => {
                self.handle_recall(notice).await;
            }
        }
    }

    /// Shadow `message` if policy accepts it.
    ///
    /// Returns the kind of the record created, if any.
    #[instrument(skip_all, fields(message_id = %message.message_id, sender_id = %message.sender_id))]
    pub async fn handle_message(&self, message: InboundMessage) -> Option<ContentKind> {
        self.metrics.increment_messages_seen();
        let config = self.config.snapshot();
        let policy = &config.policy;

        if !policy.should_monitor(&message.sender_id, message.origin_id()) {
            debug!("sender not monitored");
            return None;
        }

        let mut text = String::new();
        let mut binary: Option<(ContentKind, PathBuf)> = None;

        for component in &message.components {
            let kind = component.kind();
            if !policy.kind_enabled(kind) {
                debug!(%kind, "content kind not monitored");
                continue;
            }
            match component {
                Component::Text { text: part } => text.push_str(part),
                Component::Image { file } | Component::Audio { file } => {
                    if binary.is_some() {
                        debug!(%kind, "message already shadowed a file, skipping component");
                        continue;
                    }
                    match self
                        .materializer
                        .materialize(file, &message.message_id, kind)
                        .await
                    {
                        Some(path) => binary = Some((kind, path)),
                        None => self.metrics.increment_fetch_failures(),
                    }
                }
            }
        }

        let record = match binary {
            Some((kind, path)) => ShadowRecord::file(
                message.message_id.clone(),
                kind,
                message.sender_id.clone(),
                message.sender_name.clone(),
                message.origin.clone(),
                path,
            ),
            None if !text.is_empty() => ShadowRecord::text(
                message.message_id.clone(),
                message.sender_id.clone(),
                message.sender_name.clone(),
                message.origin.clone(),
                text,
            ),
            None => {
                debug!("nothing to shadow");
                return None;
            }
        }
        .with_created_at(message.received_at);

        Some(self.insert(record).await)
    }

    async fn insert(&self, record: ShadowRecord) -> ContentKind {
        let kind = record.kind;
        let new_path = record.file_path().map(std::path::Path::to_path_buf);
        let displaced = self.store.lock().insert(record);

        for old in displaced {
            debug!(message_id = %old.message_id, kind = %old.kind, "replaced existing record");
            if let Some(path) = old.file_path() {
                if Some(path) != new_path.as_deref() && discard_file(path).await {
                    self.metrics.increment_files_deleted();
                }
            }
        }

        self.metrics.increment_records_created();
        info!(%kind, "message shadowed");
        kind
    }

    /// Forward and release the record matching `notice`, if any.
    ///
    /// Returns `None` when nothing was forwarded: the message was never
    /// shadowed, or the recall-actor gate rejected the recall. A gated recall
    /// leaves the record in place.
    #[instrument(skip_all, fields(message_id = %notice.message_id))]
    pub async fn handle_recall(&self, notice: RecallNotice) -> Option<ForwardReport> {
        self.metrics.increment_recalls_seen();
        let config = self.config.snapshot();

        if !config.policy.recall_permitted(notice.actor_id.as_ref()) {
            if self.correlator.is_shadowed(notice.message_id.as_str()) {
                self.metrics.increment_recalls_gated();
                debug!(
                    actor_id = notice.actor_id.as_ref().map(tracing::field::display),
                    "recall by non-monitored actor, keeping record"
                );
            }
            return None;
        }

        let record = self.correlator.correlate(notice.message_id.as_str())?;
        self.metrics.increment_recalls_matched();
        info!(kind = %record.kind, sender_id = %record.sender_id, "shadowed message recalled");

        let report = self.forwarder.forward(&record, &config.forward).await;
        if let Some(path) = record.file_path() {
            self.correlator.release(path);
        }
        Some(report)
    }

    /// Records held per kind.
    pub fn counts(&self) -> KindCounts {
        self.store.lock().counts()
    }

    /// Activity counters.
    pub fn metrics(&self) -> &Arc<GuardMetrics> {
        &self.metrics
    }

    /// The live configuration handle.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// The shared store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Build a janitor bound to this guard's store, configuration and
    /// metrics.
    pub fn janitor(&self) -> (Janitor, mpsc::Sender<()>) {
        Janitor::new(
            Arc::clone(&self.store),
            self.config.clone(),
            Arc::clone(&self.metrics),
        )
    }
}

/// A started guard: background janitor plus event loop.
#[derive(Debug)]
pub struct GuardRuntime {
    guard: Arc<RecallGuard>,
    sender: EventSender,
    janitor_shutdown: mpsc::Sender<()>,
    loop_shutdown: mpsc::Sender<()>,
    janitor_handle: JoinHandle<()>,
    loop_handle: JoinHandle<()>,
}

impl GuardRuntime {
    /// Prepare the cache directory, purge leftovers if configured, and spawn
    /// the janitor and event loop.
    pub async fn start(guard: Arc<RecallGuard>) -> Result<Self, ShadowError> {
        guard.materializer.prepare().await?;

        if guard.config.snapshot().cache.purge_on_start {
            let removed = guard.materializer.purge_stale().await?;
            if removed > 0 {
                info!(removed, "purged stale cache files");
            }
        }

        let (mut janitor, janitor_shutdown) = guard.janitor();
        let janitor_handle = tokio::spawn(async move { janitor.run().await });

        let (event_loop, sender, loop_shutdown) =
            EventLoop::new(Arc::clone(&guard), guard.queue_capacity);
        let loop_handle = tokio::spawn(event_loop.run());

        info!(
            cache_dir = %guard.materializer.cache_dir().display(),
            "recall guard started"
        );

        Ok(Self {
            guard,
            sender,
            janitor_shutdown,
            loop_shutdown,
            janitor_handle,
            loop_handle,
        })
    }

    /// Handle used to feed events into the running loop.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// The running guard.
    pub fn guard(&self) -> &Arc<RecallGuard> {
        &self.guard
    }

    /// Stop intake, stop the janitor, and wait for both tasks and every
    /// in-flight handler to finish.
    pub async fn shutdown(self) {
        info!("recall guard shutting down");
        let _ = self.loop_shutdown.send(()).await;
        let _ = self.janitor_shutdown.send(()).await;

        if let Err(e) = self.loop_handle.await {
            error!(error = %e, "event loop task failed");
        }
        if let Err(e) = self.janitor_handle.await {
            error!(error = %e, "janitor task failed");
        }
        info!("recall guard stopped");
    }
}
