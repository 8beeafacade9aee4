use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking mutation-log activity.
///
/// Implementations collect statistics about appends, hard deletes and the
/// reconstruction work readers trigger. All methods are called outside the
/// per-element locks.
pub trait StorageMetrics: Send + Sync {
    /// Records a new element registered in a table.
    fn element_created(&self);

    /// Records `count` mutations appended by a single call.
    fn mutations_appended(&self, count: usize);

    /// Records `count` mutations removed by a hard delete.
    fn mutations_removed(&self, count: usize);

    /// Records one property fold.
    ///
    /// # Parameters
    /// * `present` - Whether the fold produced a property (`false` for absent).
    fn property_folded(&self, present: bool);

    /// Records one historical reconstruction returning `entries` values.
    fn history_read(&self, entries: usize);

    /// Records one successful element materialization.
    fn element_materialized(&self);
}

/// A no-op implementation of [`StorageMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl StorageMetrics for NoopMetrics {
    fn element_created(&self) {}
    fn mutations_appended(&self, _count: usize) {}
    fn mutations_removed(&self, _count: usize) {}
    fn property_folded(&self, _present: bool) {}
    fn history_read(&self, _entries: usize) {}
    fn element_materialized(&self) {}
}

/// A thread-safe counter-based implementation of [`StorageMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of elements registered.
    pub elements_created: AtomicU64,

    /// Number of mutations appended.
    pub mutations_appended: AtomicU64,

    /// Number of append calls.
    pub append_calls: AtomicU64,

    /// Number of mutations removed by hard deletes.
    pub mutations_removed: AtomicU64,

    /// Number of folds that produced a property.
    pub properties_present: AtomicU64,

    /// Number of folds that ended absent.
    pub properties_absent: AtomicU64,

    /// Number of historical reconstructions.
    pub history_reads: AtomicU64,

    /// Total historical values returned.
    pub history_entries: AtomicU64,

    /// Number of elements materialized.
    pub elements_materialized: AtomicU64,
}

impl StorageMetrics for CounterMetrics {
    fn element_created(&self) {
        self.elements_created.fetch_add(1, Ordering::Relaxed);
    }

    fn mutations_appended(&self, count: usize) {
        self.append_calls.fetch_add(1, Ordering::Relaxed);
        self.mutations_appended
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    fn mutations_removed(&self, count: usize) {
        self.mutations_removed
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    fn property_folded(&self, present: bool) {
        if present {
            self.properties_present.fetch_add(1, Ordering::Relaxed);
        } else {
            self.properties_absent.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn history_read(&self, entries: usize) {
        self.history_reads.fetch_add(1, Ordering::Relaxed);
        self.history_entries
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    fn element_materialized(&self) {
        self.elements_materialized.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation wrapped in an [`Arc`].
///
/// The default implementation is [`NoopMetrics`], which discards everything.
pub fn default_metrics() -> Arc<dyn StorageMetrics> {
    Arc::new(NoopMetrics)
}
