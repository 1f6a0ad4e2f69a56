use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::Component;
use crate::types::{MessageId, OriginId, UserId};

/// The conversation a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Group identifier.
    pub id: OriginId,
    /// Group display name, when the platform supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Origin {
    /// An origin with no known display name.
    pub fn new(id: OriginId) -> Self {
        Self { id, name: None }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An ordinary inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message identity.
    pub message_id: MessageId,
    /// Author identity.
    pub sender_id: UserId,
    /// Author display name (group card or nickname).
    pub sender_name: String,
    /// Group the message was posted in; `None` for private messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    /// Ordered content components.
    pub components: Vec<Component>,
    /// When the event was received.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Build a message received now.
    pub fn new(
        message_id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        sender_name: impl Into<String>,
        origin: Option<Origin>,
        components: Vec<Component>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            origin,
            components,
            received_at: Utc::now(),
        }
    }

    /// Identifier of the origin group, if any.
    pub fn origin_id(&self) -> Option<&OriginId> {
        self.origin.as_ref().map(|o| &o.id)
    }
}

/// Where a recall happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum RecallScope {
    /// A recall in a group conversation.
    Group(OriginId),
    /// A recall in a one-to-one conversation.
    Private,
}

/// Notification that a previously delivered message was withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallNotice {
    /// Identity of the recalled message.
    pub message_id: MessageId,
    /// Who performed the recall, when the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<UserId>,
    /// Conversation in which the recall occurred.
    pub scope: RecallScope,
}

impl RecallNotice {
    /// Build a recall notice.
    pub fn new(
        message_id: impl Into<MessageId>,
        actor_id: Option<UserId>,
        scope: RecallScope,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            actor_id,
            scope,
        }
    }
}

/// An event delivered by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// An ordinary chat message.
    Message(InboundMessage),
    /// A group or private recall notification.
    Recall(RecallNotice),
}
