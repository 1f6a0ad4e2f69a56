//! Monitoring policy: which senders and kinds are shadowed, and which
//! recalls are forwarded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::content::ContentKind;
use crate::types::{OriginId, UserId};

/// Per-kind monitoring switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct KindToggles {
    /// Shadow plain text.
    pub text: bool,
    /// Shadow images.
    pub image: bool,
    /// Shadow voice clips.
    pub audio: bool,
}

impl Default for KindToggles {
    fn default() -> Self {
        Self {
            text: false,
            image: true,
            audio: false,
        }
    }
}

impl KindToggles {
    /// Whether the given kind is enabled.
    pub fn enabled(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Text => self.text,
            ContentKind::Image => self.image,
            ContentKind::Audio => self.audio,
        }
    }
}

/// Which recalls of a shadowed message trigger a forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallActorPolicy {
    /// Forward on any recall of a shadowed message, whoever performed it.
    #[default]
    Any,
    /// Forward only when the recall was performed by a monitored user.
    ///
    /// Recalls by anyone else (e.g. a group admin) leave the record in place.
    MonitoredOnly,
}

/// A snapshot of the monitoring configuration.
///
/// Every method is pure; callers re-read the live snapshot for each event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorPolicy {
    /// Users whose messages are shadowed.
    pub users: HashSet<UserId>,
    /// Users who are never shadowed, even when otherwise monitored.
    pub blacklist: HashSet<UserId>,
    /// Groups whose messages are shadowed when `origin_monitoring` is set.
    pub origins: HashSet<OriginId>,
    /// Enables group-level monitoring.
    pub origin_monitoring: bool,
    /// Per-kind switches.
    pub kinds: KindToggles,
    /// Recall-actor gate.
    pub recall_actor: RecallActorPolicy,
}

impl MonitorPolicy {
    /// Decide whether a message from `sender` in `origin` should be shadowed.
    ///
    /// The blacklist wins over every other rule. Origins compare
    /// case-insensitively.
    pub fn should_monitor(&self, sender: &UserId, origin: Option<&OriginId>) -> bool {
        if self.blacklist.contains(sender) {
            return false;
        }
        if self.users.contains(sender) {
            return true;
        }
        if !self.origin_monitoring {
            return false;
        }
        origin.is_some_and(|origin| {
            self.origins
                .iter()
                .any(|o| o.as_str().eq_ignore_ascii_case(origin.as_str()))
        })
    }

    /// Whether components of `kind` are cached for an accepted message.
    pub fn kind_enabled(&self, kind: ContentKind) -> bool {
        self.kinds.enabled(kind)
    }

    /// Whether a recall performed by `actor` may trigger a forward.
    pub fn recall_permitted(&self, actor: Option<&UserId>) -> bool {
        match self.recall_actor {
            RecallActorPolicy::Any => true,
            RecallActorPolicy::MonitoredOnly => actor.is_some_and(|a| self.users.contains(a)),
        }
    }
}
