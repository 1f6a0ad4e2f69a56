//! Delivers a recalled record to every configured destination, then releases
//! its backing file.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use recallguard_core::{ContentKind, ShadowPayload, ShadowRecord};
use recallguard_platform::{Destination, DynPlatform, ForwardNode, OutboundMessage, Segment};

use crate::config::{ForwardConfig, ForwardStrategy};
use crate::materializer::discard_file;
use crate::metrics::GuardMetrics;
use crate::template::PromptTemplate;

/// Outcome of a single forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForwardReport {
    /// Destinations a delivery was attempted for.
    pub attempted: usize,
    /// Destinations that received the full forward.
    pub delivered: usize,
    /// Destinations where any part of the delivery failed.
    pub failed: usize,
    /// Destinations the strategy could not address.
    pub skipped: usize,
    /// Whether the record's backing file was removed by this forward.
    pub file_deleted: bool,
}

impl ForwardReport {
    /// Whether every configured destination received the forward.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Renders and delivers recalled records.
#[derive(Clone)]
pub struct Forwarder {
    platform: Arc<dyn DynPlatform>,
    metrics: Arc<GuardMetrics>,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("platform", &self.platform.name())
            .finish_non_exhaustive()
    }
}

impl Forwarder {
    pub fn new(platform: Arc<dyn DynPlatform>, metrics: Arc<GuardMetrics>) -> Self {
        Self { platform, metrics }
    }

    /// Forward `record` according to `config` and release its file.
    ///
    /// Never fails: delivery problems are logged and counted, and the backing
    /// file is deleted once every destination has been attempted, or right
    /// away when there are no destinations.
    #[instrument(skip_all, fields(message_id = %record.message_id, kind = %record.kind))]
    pub async fn forward(&self, record: &ShadowRecord, config: &ForwardConfig) -> ForwardReport {
        let mut report = ForwardReport::default();

        if config.destinations.is_empty() {
            info!("no forward destinations configured, discarding shadow copy");
        } else {
            let template = PromptTemplate::new(config.template.as_str()).unwrap_or_else(|e| {
                warn!(error = %e, "invalid prompt template, using default");
                PromptTemplate::default()
            });
            let prompt = template.render_record(record);
            let content = content_segment(record);

            match config.strategy {
                ForwardStrategy::Sequential => {
                    self.forward_sequential(&config.destinations, &prompt, &content, &mut report)
                        .await;
                }
                ForwardStrategy::Merged => {
                    self.forward_merged(config, &prompt, content, &mut report)
                        .await;
                }
            }

            info!(
                delivered = report.delivered,
                failed = report.failed,
                skipped = report.skipped,
                "recalled message forwarded"
            );
        }

        if let Some(path) = record.file_path() {
            report.file_deleted = discard_file(path).await;
            if report.file_deleted {
                self.metrics.increment_files_deleted();
            }
        }
        report
    }

    async fn forward_sequential(
        &self,
        destinations: &[Destination],
        prompt: &str,
        content: &Segment,
        report: &mut ForwardReport,
    ) {
        let prompt = OutboundMessage::text(prompt);
        let content = OutboundMessage::from_segments(vec![content.clone()]);

        for destination in destinations {
            report.attempted += 1;
            // The content is sent even when the prompt was lost.
            let prompt_result = self.platform.send_message(destination, &prompt).await;
            let content_result = self.platform.send_message(destination, &content).await;
            match prompt_result.and(content_result) {
                Ok(()) => {
                    report.delivered += 1;
                    self.metrics.increment_forwards_delivered();
                }
                Err(e) => {
                    warn!(destination = %destination, error = %e, "forward delivery failed");
                    report.failed += 1;
                    self.metrics.increment_delivery_failures();
                }
            }
        }
    }

    async fn forward_merged(
        &self,
        config: &ForwardConfig,
        prompt: &str,
        content: Segment,
        report: &mut ForwardReport,
    ) {
        let nodes = [
            ForwardNode::new(
                config.bot_id.clone(),
                config.bot_name.as_str(),
                vec![Segment::Text(prompt.to_owned())],
            ),
            ForwardNode::new(config.bot_id.clone(), config.bot_name.as_str(), vec![content]),
        ];

        for destination in &config.destinations {
            let Some(group) = destination.as_group() else {
                warn!(destination = %destination, "merged forward only supports groups, skipping");
                report.skipped += 1;
                self.metrics.increment_merged_destinations_skipped();
                continue;
            };
            report.attempted += 1;
            match self.platform.send_group_forward(group, &nodes).await {
                Ok(()) => {
                    report.delivered += 1;
                    self.metrics.increment_forwards_delivered();
                }
                Err(e) => {
                    warn!(destination = %destination, error = %e, "merged forward delivery failed");
                    report.failed += 1;
                    self.metrics.increment_delivery_failures();
                }
            }
        }
    }
}

/// The segment carrying a record's original content.
fn content_segment(record: &ShadowRecord) -> Segment {
    match (&record.payload, record.kind) {
        (ShadowPayload::Text { text }, _) => Segment::Text(text.clone()),
        (ShadowPayload::File { path }, ContentKind::Audio) => Segment::Audio(path.clone()),
        (ShadowPayload::File { path }, ContentKind::Image | ContentKind::Text) => {
            Segment::Image(path.clone())
        }
    }
}
