//! In-memory platform double for tests.
//!
//! [`RecordingPlatform`] resolves file references from a table, records every
//! delivery attempt, and can be told to fail specific destinations or fetches.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;

use recallguard_core::{ContentKind, OriginId};

use crate::error::PlatformError;
use crate::message::{Destination, ForwardNode, OutboundMessage};
use crate::platform::Platform;

/// How a registered file reference resolves.
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    /// Resolve to the given local path.
    Path(PathBuf),
    /// Fail with [`PlatformError::Timeout`].
    Timeout,
    /// Fail with [`PlatformError::Api`] carrying the message.
    Fail(String),
    /// Never complete.
    Hang,
    /// Panic inside the fetch, as a buggy platform would.
    Panic,
}

/// A single delivery attempt seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A `send_message` call.
    Message {
        /// Target of the call.
        destination: Destination,
        /// Message passed to the call.
        message: OutboundMessage,
        /// Whether the call reported success.
        delivered: bool,
    },
    /// A `send_group_forward` call.
    GroupForward {
        /// Target group.
        group: OriginId,
        /// Nodes passed to the call.
        nodes: Vec<ForwardNode>,
        /// Whether the call reported success.
        delivered: bool,
    },
}

impl Delivery {
    /// Whether the attempt reported success.
    pub fn delivered(&self) -> bool {
        match self {
            Self::Message { delivered, .. } | Self::GroupForward { delivered, .. } => *delivered,
        }
    }
}

/// A [`Platform`] that records calls instead of talking to a chat service.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    files: Mutex<HashMap<String, FetchBehavior>>,
    failing: Mutex<HashSet<String>>,
    deliveries: Mutex<Vec<Delivery>>,
    fetches: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    /// Create an empty platform with no known files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register how `file_ref` resolves.
    pub fn set_file(&self, file_ref: impl Into<String>, behavior: FetchBehavior) {
        self.files.lock().insert(file_ref.into(), behavior);
    }

    /// Make every send to `destination` fail with a connection error.
    pub fn fail_destination(&self, destination: &Destination) {
        self.failing.lock().insert(destination.to_string());
    }

    /// Every delivery attempt, in call order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Every file reference passed to `fetch_remote_file`, in call order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    fn fails(&self, destination: &str) -> bool {
        self.failing.lock().contains(destination)
    }
}

impl Platform for RecordingPlatform {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "recording"
    }

    async fn fetch_remote_file(
        &self,
        kind: ContentKind,
        file_ref: &str,
    ) -> Result<PathBuf, PlatformError> {
        self.fetches.lock().push(file_ref.to_owned());
        let behavior = self.files.lock().get(file_ref).cloned();
        match behavior {
            Some(FetchBehavior::Path(path)) => Ok(path),
            Some(FetchBehavior::Timeout) => Err(PlatformError::Timeout(Duration::from_secs(30))),
            Some(FetchBehavior::Fail(msg)) => Err(PlatformError::Api(msg)),
            Some(FetchBehavior::Hang) => std::future::pending().await,
            Some(FetchBehavior::Panic) => panic!("fetch of {file_ref} panicked"),
            None => Err(PlatformError::Api(format!("unknown {kind} reference {file_ref}"))),
        }
    }

    #[allow(clippy::unused_async)]
    async fn send_message(
        &self,
        destination: &Destination,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        let delivered = !self.fails(&destination.to_string());
        self.deliveries.lock().push(Delivery::Message {
            destination: destination.clone(),
            message: message.clone(),
            delivered,
        });
        if delivered {
            Ok(())
        } else {
            Err(PlatformError::Connection(format!("{destination} unreachable")))
        }
    }

    #[allow(clippy::unused_async)]
    async fn send_group_forward(
        &self,
        group: &OriginId,
        nodes: &[ForwardNode],
    ) -> Result<(), PlatformError> {
        let delivered = !self.fails(&format!("group:{group}"));
        self.deliveries.lock().push(Delivery::GroupForward {
            group: group.clone(),
            nodes: nodes.to_vec(),
            delivered,
        });
        if delivered {
            Ok(())
        } else {
            Err(PlatformError::Connection(format!("group:{group} unreachable")))
        }
    }
}
