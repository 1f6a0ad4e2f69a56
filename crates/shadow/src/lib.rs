//! Shadow cache for recalled chat messages.
//!
//! Monitored messages are copied into a typed, time- and size-bounded store
//! keyed by message id. When the platform reports a recall, the matching
//! record is removed and forwarded to the configured destinations, and its
//! backing file is deleted. A [`Janitor`] evicts records that outlive their
//! lifetime and keeps the cache directory under its size cap.

pub mod builder;
pub mod config;
pub mod correlator;
pub mod error;
pub mod event_loop;
pub mod forwarder;
pub mod guard;
pub mod janitor;
pub mod materializer;
pub mod metrics;
pub mod store;
pub mod template;

pub use builder::RecallGuardBuilder;
pub use config::{CacheConfig, ConfigHandle, ForwardConfig, ForwardStrategy, GuardConfig};
pub use correlator::RecallCorrelator;
pub use error::ShadowError;
pub use event_loop::{EventLoop, EventSender};
pub use forwarder::{ForwardReport, Forwarder};
pub use guard::{GuardRuntime, RecallGuard};
pub use janitor::{Janitor, SweepReport};
pub use materializer::FileMaterializer;
pub use metrics::{GuardMetrics, MetricsSnapshot};
pub use store::{KindCounts, SharedStore, ShadowStore};
pub use template::{PromptFields, PromptTemplate};
