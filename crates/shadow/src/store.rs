//! The shadow store: message id -> record, partitioned by content kind.
//!
//! The store only holds records. Whoever removes a record owns it from then
//! on and is responsible for its backing file; the store never touches the
//! filesystem.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use recallguard_core::{ContentKind, MessageId, ShadowRecord};

/// Shared handle to the single store instance.
///
/// Ingestion, correlation and the janitor run on separate tasks, so every
/// access goes through this mutex. Never hold the lock across an `.await`.
pub type SharedStore = Arc<Mutex<ShadowStore>>;

/// Number of records held per partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub text: usize,
    pub image: usize,
    pub audio: usize,
}

impl KindCounts {
    /// Total records across partitions.
    pub fn total(&self) -> usize {
        self.text + self.image + self.audio
    }
}

/// Typed mapping of message identity to shadow record.
#[derive(Debug, Default)]
pub struct ShadowStore {
    text: HashMap<MessageId, ShadowRecord>,
    image: HashMap<MessageId, ShadowRecord>,
    audio: HashMap<MessageId, ShadowRecord>,
    /// Files whose record has been taken for forwarding but not yet cleaned up.
    in_flight: HashSet<PathBuf>,
}

impl ShadowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new empty store in a shared handle.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    fn partition(&self, kind: ContentKind) -> &HashMap<MessageId, ShadowRecord> {
        match kind {
            ContentKind::Text => &self.text,
            ContentKind::Image => &self.image,
            ContentKind::Audio => &self.audio,
        }
    }

    fn partition_mut(&mut self, kind: ContentKind) -> &mut HashMap<MessageId, ShadowRecord> {
        match kind {
            ContentKind::Text => &mut self.text,
            ContentKind::Image => &mut self.image,
            ContentKind::Audio => &mut self.audio,
        }
    }

    /// Insert a record into the partition of its kind.
    ///
    /// Any record already stored under the same id, in any partition, is
    /// removed first and returned so the caller can release its file.
    pub fn insert(&mut self, record: ShadowRecord) -> Vec<ShadowRecord> {
        let mut displaced = Vec::new();
        for kind in ContentKind::ALL {
            if let Some(old) = self.partition_mut(kind).remove(&record.message_id) {
                displaced.push(old);
            }
        }
        self.partition_mut(record.kind)
            .insert(record.message_id.clone(), record);
        displaced
    }

    /// Remove and return the record for `message_id`.
    ///
    /// Partitions are scanned in [`ContentKind::ALL`] order and the scan stops
    /// at the first hit.
    pub fn take(&mut self, message_id: &str) -> Option<ShadowRecord> {
        ContentKind::ALL
            .into_iter()
            .find_map(|kind| self.partition_mut(kind).remove(message_id))
    }

    /// Look up a record without removing it.
    pub fn get(&self, message_id: &str) -> Option<&ShadowRecord> {
        ContentKind::ALL
            .into_iter()
            .find_map(|kind| self.partition(kind).get(message_id))
    }

    /// Whether any partition holds `message_id`.
    pub fn contains(&self, message_id: &str) -> bool {
        self.get(message_id).is_some()
    }

    /// Remove every record older than `lifetime` at `now`.
    pub fn remove_expired(
        &mut self,
        now: DateTime<Utc>,
        lifetime: chrono::Duration,
    ) -> Vec<ShadowRecord> {
        let mut expired = Vec::new();
        for kind in ContentKind::ALL {
            let partition = self.partition_mut(kind);
            let ids: Vec<MessageId> = partition
                .values()
                .filter(|r| r.age(now) > lifetime)
                .map(|r| r.message_id.clone())
                .collect();
            for id in ids {
                if let Some(record) = partition.remove(&id) {
                    expired.push(record);
                }
            }
        }
        expired
    }

    /// Remove the record backed by `path`.
    ///
    /// `id_hint` (the message id derived from the file name) is tried first;
    /// if it does not match, partitions are scanned by path.
    pub fn remove_backed_by(&mut self, id_hint: &str, path: &Path) -> Option<ShadowRecord> {
        let hinted = ContentKind::ALL.into_iter().find(|kind| {
            self.partition(*kind)
                .get(id_hint)
                .is_some_and(|r| r.file_path() == Some(path))
        });
        if let Some(kind) = hinted {
            return self.partition_mut(kind).remove(id_hint);
        }

        let (kind, id) = ContentKind::ALL.into_iter().find_map(|kind| {
            self.partition(kind)
                .values()
                .find(|r| r.file_path() == Some(path))
                .map(|r| (kind, r.message_id.clone()))
        })?;
        self.partition_mut(kind).remove(&id)
    }

    /// Mark a file as owned by an in-progress forward.
    pub fn mark_in_flight(&mut self, path: &Path) {
        self.in_flight.insert(path.to_path_buf());
    }

    /// Clear the in-flight mark once the forward has cleaned up.
    pub fn release(&mut self, path: &Path) {
        self.in_flight.remove(path);
    }

    /// Whether a file is owned by an in-progress forward.
    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.in_flight.contains(path)
    }

    /// Records held per partition.
    pub fn counts(&self) -> KindCounts {
        KindCounts {
            text: self.text.len(),
            image: self.image.len(),
            audio: self.audio.len(),
        }
    }

    /// Total records held.
    pub fn len(&self) -> usize {
        self.counts().total()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use recallguard_core::UserId;

    use super::*;

    fn text(id: &str) -> ShadowRecord {
        ShadowRecord::text(MessageId::new(id), UserId::new("42"), "alice", None, "hi")
    }

    fn image(id: &str, path: &str) -> ShadowRecord {
        ShadowRecord::file(
            MessageId::new(id),
            ContentKind::Image,
            UserId::new("42"),
            "alice",
            None,
            path,
        )
    }

    #[test]
    fn insert_and_take() {
        let mut store = ShadowStore::new();
        assert!(store.insert(text("1")).is_empty());
        assert!(store.contains("1"));

        let record = store.take("1").unwrap();
        assert_eq!(record.message_id.as_str(), "1");
        assert!(!store.contains("1"));
        assert!(store.take("1").is_none());
    }

    #[test]
    fn take_unknown_is_none() {
        let mut store = ShadowStore::new();
        store.insert(text("1"));
        assert!(store.take("2").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn insert_same_id_other_kind_displaces() {
        let mut store = ShadowStore::new();
        store.insert(text("1"));
        let displaced = store.insert(image("1", "/c/1.png"));

        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].kind, ContentKind::Text);
        let counts = store.counts();
        assert_eq!(counts.text, 0);
        assert_eq!(counts.image, 1);
        assert_eq!(store.get("1").unwrap().kind, ContentKind::Image);
    }

    #[test]
    fn insert_overwrites_same_partition() {
        let mut store = ShadowStore::new();
        store.insert(image("1", "/c/1.png"));
        let displaced = store.insert(image("1", "/c/1.jpg"));
        assert_eq!(displaced.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("1").unwrap().file_path(),
            Some(Path::new("/c/1.jpg"))
        );
    }

    #[test]
    fn remove_expired_is_strict() {
        let now = Utc::now();
        let mut store = ShadowStore::new();
        store.insert(text("old").with_created_at(now - chrono::Duration::seconds(150)));
        store.insert(text("young").with_created_at(now - chrono::Duration::seconds(50)));
        store.insert(text("edge").with_created_at(now - chrono::Duration::seconds(100)));

        let expired = store.remove_expired(now, chrono::Duration::seconds(100));
        let ids: Vec<_> = expired.iter().map(|r| r.message_id.as_str()).collect();
        assert_eq!(ids, vec!["old"]);
        assert!(store.contains("young"));
        assert!(store.contains("edge"));

        assert!(
            store
                .remove_expired(now, chrono::Duration::seconds(100))
                .is_empty()
        );
    }

    #[test]
    fn remove_backed_by_hint_or_scan() {
        let mut store = ShadowStore::new();
        store.insert(image("1", "/c/1.png"));
        store.insert(image("weird/id", "/c/weird_id.png"));

        let hit = store.remove_backed_by("1", Path::new("/c/1.png")).unwrap();
        assert_eq!(hit.message_id.as_str(), "1");

        let scanned = store
            .remove_backed_by("weird_id", Path::new("/c/weird_id.png"))
            .unwrap();
        assert_eq!(scanned.message_id.as_str(), "weird/id");

        assert!(store.remove_backed_by("1", Path::new("/c/1.png")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn hint_with_mismatched_path_is_not_removed() {
        let mut store = ShadowStore::new();
        store.insert(image("1", "/c/1.png"));
        assert!(store.remove_backed_by("1", Path::new("/c/other.png")).is_none());
        assert!(store.contains("1"));
    }

    #[test]
    fn in_flight_marks() {
        let mut store = ShadowStore::new();
        let path = Path::new("/c/1.png");
        assert!(!store.is_in_flight(path));
        store.mark_in_flight(path);
        assert!(store.is_in_flight(path));
        store.release(path);
        assert!(!store.is_in_flight(path));
    }
}
