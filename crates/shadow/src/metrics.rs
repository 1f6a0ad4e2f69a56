use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking shadow-cache activity.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct GuardMetrics {
    /// Inbound messages seen.
    pub messages_seen: AtomicU64,
    /// Shadow records created.
    pub records_created: AtomicU64,
    /// Materializations that failed softly (timeout or fetch/copy error).
    pub fetch_failures: AtomicU64,
    /// Recall notices seen.
    pub recalls_seen: AtomicU64,
    /// Recall notices that matched a shadow record.
    pub recalls_matched: AtomicU64,
    /// Recalls of shadowed messages rejected by the recall-actor gate.
    pub recalls_gated: AtomicU64,
    /// Successful deliveries to a single destination.
    pub forwards_delivered: AtomicU64,
    /// Failed deliveries to a single destination.
    pub delivery_failures: AtomicU64,
    /// Non-group destinations skipped by the merged strategy.
    pub merged_destinations_skipped: AtomicU64,
    /// Records removed by the age sweep.
    pub evicted_by_age: AtomicU64,
    /// Records removed by the size sweep.
    pub evicted_by_size: AtomicU64,
    /// Cache files deleted (any path).
    pub files_deleted: AtomicU64,
    /// Per-file sweep failures.
    pub sweep_errors: AtomicU64,
    /// Handler invocations that panicked.
    pub handler_panics: AtomicU64,
}

impl GuardMetrics {
    /// Increment the messages-seen counter.
    pub fn increment_messages_seen(&self) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the records-created counter.
    pub fn increment_records_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the soft fetch failure counter.
    pub fn increment_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the recalls-seen counter.
    pub fn increment_recalls_seen(&self) {
        self.recalls_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the recalls-matched counter.
    pub fn increment_recalls_matched(&self) {
        self.recalls_matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the gated-recall counter.
    pub fn increment_recalls_gated(&self) {
        self.recalls_gated.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the delivered counter.
    pub fn increment_forwards_delivered(&self) {
        self.forwards_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the delivery failure counter.
    pub fn increment_delivery_failures(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the skipped merged destination counter.
    pub fn increment_merged_destinations_skipped(&self) {
        self.merged_destinations_skipped
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the age-eviction counter.
    pub fn add_evicted_by_age(&self, n: u64) {
        self.evicted_by_age.fetch_add(n, Ordering::Relaxed);
    }

    /// Add to the size-eviction counter.
    pub fn add_evicted_by_size(&self, n: u64) {
        self.evicted_by_size.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the deleted-file counter.
    pub fn increment_files_deleted(&self) {
        self.files_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the sweep error counter.
    pub fn increment_sweep_errors(&self) {
        self.sweep_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the handler panic counter.
    pub fn increment_handler_panics(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_seen: self.messages_seen.load(Ordering::Relaxed),
            records_created: self.records_created.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            recalls_seen: self.recalls_seen.load(Ordering::Relaxed),
            recalls_matched: self.recalls_matched.load(Ordering::Relaxed),
            recalls_gated: self.recalls_gated.load(Ordering::Relaxed),
            forwards_delivered: self.forwards_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            merged_destinations_skipped: self.merged_destinations_skipped.load(Ordering::Relaxed),
            evicted_by_age: self.evicted_by_age.load(Ordering::Relaxed),
            evicted_by_size: self.evicted_by_size.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            sweep_errors: self.sweep_errors.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`GuardMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub messages_seen: u64,
    pub records_created: u64,
    pub fetch_failures: u64,
    pub recalls_seen: u64,
    pub recalls_matched: u64,
    pub recalls_gated: u64,
    pub forwards_delivered: u64,
    pub delivery_failures: u64,
    pub merged_destinations_skipped: u64,
    pub evicted_by_age: u64,
    pub evicted_by_size: u64,
    pub files_deleted: u64,
    pub sweep_errors: u64,
    pub handler_panics: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let metrics = GuardMetrics::default();
        metrics.increment_messages_seen();
        metrics.increment_messages_seen();
        metrics.increment_records_created();
        metrics.add_evicted_by_age(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_seen, 2);
        assert_eq!(snap.records_created, 1);
        assert_eq!(snap.evicted_by_age, 3);
        assert_eq!(snap.recalls_seen, 0);
    }
}
