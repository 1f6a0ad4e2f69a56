use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use recallguard_core::{OriginId, UserId};

use crate::error::PlatformError;

/// An outbound delivery target.
///
/// Written in configuration as `group:<id>` or `private:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    /// A group conversation.
    Group(OriginId),
    /// A one-to-one conversation with a user.
    Private(UserId),
}

impl Destination {
    /// The group id, if this is a group destination.
    pub fn as_group(&self) -> Option<&OriginId> {
        match self {
            Self::Group(id) => Some(id),
            Self::Private(_) => None,
        }
    }
}

impl FromStr for Destination {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| PlatformError::InvalidDestination(s.to_owned()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(PlatformError::InvalidDestination(s.to_owned()));
        }
        match scope.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(Self::Group(OriginId::new(id))),
            "private" | "friend" => Ok(Self::Private(UserId::new(id))),
            _ => Err(PlatformError::InvalidDestination(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Destination {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Private(id) => write!(f, "private:{id}"),
        }
    }
}

/// One piece of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text.
    Text(String),
    /// A local image file.
    Image(PathBuf),
    /// A local voice clip.
    Audio(PathBuf),
}

impl Segment {
    /// The local file a segment refers to, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Text(_) => None,
            Self::Image(p) | Self::Audio(p) => Some(p),
        }
    }
}

/// An ordered list of segments delivered as one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message segments, in display order.
    pub segments: Vec<Segment>,
}

impl OutboundMessage {
    /// A message with a single text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(text.into())],
        }
    }

    /// A message carrying the given segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Concatenated text of all text segments.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One entry of a merged (combined) forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardNode {
    /// Identity the entry is displayed as.
    pub actor_id: UserId,
    /// Display name of the entry.
    pub actor_name: String,
    /// Entry content.
    pub content: Vec<Segment>,
}

impl ForwardNode {
    /// Build a node.
    pub fn new(actor_id: UserId, actor_name: impl Into<String>, content: Vec<Segment>) -> Self {
        Self {
            actor_id,
            actor_name: actor_name.into(),
            content,
        }
    }
}
