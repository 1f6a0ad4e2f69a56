use std::path::Path;

use tracing::debug;

use recallguard_core::ShadowRecord;

use crate::store::SharedStore;

/// Maps a recall notice back to at most one shadow record.
#[derive(Debug, Clone)]
pub struct RecallCorrelator {
    store: SharedStore,
}

impl RecallCorrelator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Remove and return the record for `message_id`.
    ///
    /// A file-backed record's path is marked in flight so the size sweep
    /// leaves it alone until [`release`](Self::release) is called. A miss is
    /// the common case and is not an error.
    pub fn correlate(&self, message_id: &str) -> Option<ShadowRecord> {
        let mut store = self.store.lock();
        let Some(record) = store.take(message_id) else {
            debug!(message_id, "recall of unshadowed message");
            return None;
        };
        if let Some(path) = record.file_path() {
            store.mark_in_flight(path);
        }
        Some(record)
    }

    /// Whether a record for `message_id` is currently held.
    pub fn is_shadowed(&self, message_id: &str) -> bool {
        self.store.lock().contains(message_id)
    }

    /// Clear the in-flight mark after the forward cleaned up `path`.
    pub fn release(&self, path: &Path) {
        self.store.lock().release(path);
    }
}
