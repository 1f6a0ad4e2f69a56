use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentKind;
use crate::event::Origin;
use crate::types::{MessageId, UserId};

/// The retained content of a shadow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShadowPayload {
    /// Inline text content.
    Text {
        /// The captured text.
        text: String,
    },
    /// A materialized file in the cache directory, owned by the record.
    File {
        /// Absolute or cache-relative path of the materialized copy.
        path: PathBuf,
    },
}

/// A retained, time-bounded copy of a monitored message.
///
/// Sender and origin identity are captured at ingestion and never
/// re-resolved. A `File` payload is exclusively owned by the record: whoever
/// removes the record from the store is responsible for deleting the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowRecord {
    /// Primary key.
    pub message_id: MessageId,
    /// Partition the record lives in.
    pub kind: ContentKind,
    /// Original author.
    pub sender_id: UserId,
    /// Display name of the original author at ingestion time.
    pub sender_name: String,
    /// Conversation the message came from, `None` for private chats.
    pub origin: Option<Origin>,
    /// The shadowed content.
    pub payload: ShadowPayload,
    /// Ingestion timestamp, used for age eviction.
    pub created_at: DateTime<Utc>,
}

impl ShadowRecord {
    /// Build a text record stamped with the current time.
    pub fn text(
        message_id: MessageId,
        sender_id: UserId,
        sender_name: impl Into<String>,
        origin: Option<Origin>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            message_id,
            kind: ContentKind::Text,
            sender_id,
            sender_name: sender_name.into(),
            origin,
            payload: ShadowPayload::Text { text: text.into() },
            created_at: Utc::now(),
        }
    }

    /// Build a file-backed record stamped with the current time.
    pub fn file(
        message_id: MessageId,
        kind: ContentKind,
        sender_id: UserId,
        sender_name: impl Into<String>,
        origin: Option<Origin>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            message_id,
            kind,
            sender_id,
            sender_name: sender_name.into(),
            origin,
            payload: ShadowPayload::File { path: path.into() },
            created_at: Utc::now(),
        }
    }

    /// Override the ingestion timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Path of the backing file, if the payload is file-backed.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.payload {
            ShadowPayload::File { path } => Some(path),
            ShadowPayload::Text { .. } => None,
        }
    }

    /// Age of the record relative to `now`. Never negative.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OriginId;

    #[test]
    fn text_record_has_no_file() {
        let record = ShadowRecord::text(
            MessageId::new("1"),
            UserId::new("42"),
            "alice",
            None,
            "hello",
        );
        assert_eq!(record.kind, ContentKind::Text);
        assert!(record.file_path().is_none());
    }

    #[test]
    fn file_record_exposes_path() {
        let record = ShadowRecord::file(
            MessageId::new("2"),
            ContentKind::Image,
            UserId::new("42"),
            "alice",
            Some(Origin::new(OriginId::new("g1"))),
            "/tmp/cache/2.png",
        );
        assert_eq!(record.file_path(), Some(Path::new("/tmp/cache/2.png")));
    }

    #[test]
    fn age_is_clamped_at_zero() {
        let now = Utc::now();
        let record = ShadowRecord::text(MessageId::new("3"), UserId::new("1"), "a", None, "x")
            .with_created_at(now + chrono::Duration::seconds(30));
        assert_eq!(record.age(now), chrono::Duration::zero());

        let old = record.with_created_at(now - chrono::Duration::seconds(150));
        assert_eq!(old.age(now).num_seconds(), 150);
    }
}
