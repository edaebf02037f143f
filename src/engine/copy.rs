//! # Worker copies and their raw callbacks.
//!
//! The execution engine runs an operation as N [`StepCopy`] instances, each on
//! its own thread. Copies accept listeners and invoke them from that thread,
//! once per occurrence, with no ordering across copies.

use std::sync::Arc;

/// Row counters of one copy, read synchronously at aggregation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyCounters {
    pub lines_read: u64,
    pub lines_written: u64,
    pub lines_rejected: u64,
    /// Rows fully handled by the copy; summed over copies, `lines_read - processed`
    /// are in flight.
    pub processed: u64,
}

/// One running worker instance of an operation.
pub trait StepCopy: Send + Sync + 'static {
    /// Copy number within the operation (for logs only).
    fn copy_nr(&self) -> usize;

    /// Registers a listener for "became active" / "finished".
    fn add_lifecycle_listener(&self, listener: Arc<dyn LifecycleListener>);

    /// Registers a listener for row read / written / error-row written.
    fn add_row_listener(&self, listener: Arc<dyn RowListener>);

    /// Current counters of this copy.
    fn counters(&self) -> CopyCounters;
}

/// Lifecycle callbacks, invoked on the copy's worker thread.
pub trait LifecycleListener: Send + Sync {
    fn copy_active(&self, copy: &dyn StepCopy);
    fn copy_finished(&self, copy: &dyn StepCopy);
}

/// Row callbacks, invoked on the copy's worker thread for every row.
///
/// Implementations must return quickly: they sit on the data path.
pub trait RowListener: Send + Sync {
    fn row_read(&self, copy: &dyn StepCopy);
    fn row_written(&self, copy: &dyn StepCopy);
    fn error_row_written(&self, copy: &dyn StepCopy);
}
