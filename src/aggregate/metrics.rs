//! # Serialized metrics aggregation.
//!
//! Row callbacks from every copy are turned into recompute requests and queued
//! to **one** worker task per operation. The worker drains the queue in FIFO
//! order, sums the counters of all copies and publishes the snapshot. It is
//! the only writer to the metrics channel, so subscribers see snapshots in a
//! total order and never interleaved.
//!
//! ## Architecture
//! ```text
//! copy 1 ─┐ row_read / row_written / error_row_written
//! copy 2 ─┼──► signal() ──► [unbounded queue] ──► worker task ──► Channel::send(Metrics)
//! copy N ─┘  (non-blocking)        FIFO              │
//!                                                    └─ aggregate(copies): Σ counters
//! ```
//!
//! ## Rules
//! - **Non-blocking enqueue**: `signal()` never waits; the data path is not stalled.
//! - **One in flight**: a snapshot is computed and published before the next starts.
//! - **Panic isolation**: a panic while reading counters is logged; the worker continues.
//! - **Drain on shutdown**: [`shutdown`](MetricsAggregator::shutdown) stops
//!   accepting signals and publishes a snapshot for every signal already queued,
//!   so the last snapshot carries the final totals.
//! - **Hard stop**: [`cancel`](MetricsAggregator::cancel), drop, or an expired
//!   shutdown grace stops the worker at once; queued signals are discarded.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::panic_message;
use crate::engine::{RowListener, StepCopy};
use crate::events::{Channel, Event, MetricsSnapshot};

/// Raw row signal that triggers a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSignal {
    Read,
    Written,
    ErrorWritten,
}

#[derive(Debug, Clone, Copy)]
struct Signal {
    kind: RowSignal,
    copy: usize,
}

/// Sums the current counters of every copy.
///
/// In-flight rows are `Σ lines_read - Σ processed`, floored at zero once over
/// the totals: a copy that processed rows read by another does not inflate it.
pub fn aggregate(copies: &[Arc<dyn StepCopy>]) -> MetricsSnapshot {
    let (snapshot, processed) = copies.iter().map(|copy| copy.counters()).fold(
        (MetricsSnapshot::default(), 0u64),
        |(acc, processed), c| {
            (
                MetricsSnapshot {
                    lines_read: acc.lines_read.saturating_add(c.lines_read),
                    lines_written: acc.lines_written.saturating_add(c.lines_written),
                    lines_rejected: acc.lines_rejected.saturating_add(c.lines_rejected),
                    lines_in_flight: 0,
                },
                processed.saturating_add(c.processed),
            )
        },
    );
    MetricsSnapshot {
        lines_in_flight: snapshot.lines_read.saturating_sub(processed),
        ..snapshot
    }
}

/// Front half of the aggregator: accepts signals from copy threads.
pub struct MetricsAggregator {
    operation: Arc<str>,
    tx: mpsc::UnboundedSender<Signal>,
    drain: CancellationToken,
    token: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsAggregator {
    /// Spawns the worker on `runtime` and returns the aggregator feeding it.
    pub fn spawn(
        runtime: &Handle,
        operation: Arc<str>,
        copies: Vec<Arc<dyn StepCopy>>,
        channel: Channel,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let drain = CancellationToken::new();
        let token = CancellationToken::new();
        let worker = Worker {
            operation: Arc::clone(&operation),
            copies,
            channel,
            drain: drain.clone(),
            token: token.clone(),
        };
        let handle = runtime.spawn(worker.run(rx));

        Self {
            operation,
            tx,
            drain,
            token,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Queues a recompute request. Never blocks.
    pub fn signal(&self, kind: RowSignal, copy: usize) {
        if self.tx.send(Signal { kind, copy }).is_err() {
            trace!(operation = %self.operation, ?kind, copy, "metrics worker stopped; signal discarded");
        }
    }

    /// True until the worker has been told to stop.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.drain.is_cancelled() && !self.tx.is_closed()
    }

    /// Stops the worker at once, discarding queued signals. Does not wait.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Stops accepting signals, drains the queue and waits for the worker.
    ///
    /// If draining takes longer than `grace` (e.g. a `Block` subscriber stopped
    /// reading), the worker is cancelled and the rest of the queue discarded.
    /// A `grace` of zero cancels immediately.
    pub async fn shutdown(&self, grace: Duration) {
        self.drain.cancel();
        let handle = self.worker.lock().take();
        let Some(mut handle) = handle else {
            return;
        };

        let joined = match tokio::time::timeout(grace, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(operation = %self.operation, ?grace, "metrics drain exceeded grace; cancelling");
                self.token.cancel();
                handle.await
            }
        };
        if let Err(err) = joined {
            if err.is_panic() {
                error!(operation = %self.operation, "metrics worker panicked");
            }
        }
    }
}

impl Drop for MetricsAggregator {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl RowListener for MetricsAggregator {
    fn row_read(&self, copy: &dyn StepCopy) {
        self.signal(RowSignal::Read, copy.copy_nr());
    }

    fn row_written(&self, copy: &dyn StepCopy) {
        self.signal(RowSignal::Written, copy.copy_nr());
    }

    fn error_row_written(&self, copy: &dyn StepCopy) {
        self.signal(RowSignal::ErrorWritten, copy.copy_nr());
    }
}

/// Back half: the single serial worker.
struct Worker {
    operation: Arc<str>,
    copies: Vec<Arc<dyn StepCopy>>,
    channel: Channel,
    drain: CancellationToken,
    token: CancellationToken,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Signal>) {
        debug!(operation = %self.operation, copies = self.copies.len(), "metrics worker started");
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = self.drain.cancelled() => {
                    self.drain_queue(&mut rx).await;
                    break;
                }
                msg = rx.recv() => match msg {
                    Some(signal) => self.emit(signal).await,
                    None => break,
                }
            }
        }
        debug!(operation = %self.operation, "metrics worker stopped");
    }

    /// Closes the queue to new signals and emits for every one still in it.
    async fn drain_queue(&self, rx: &mut mpsc::UnboundedReceiver<Signal>) {
        rx.close();
        let mut drained = 0usize;
        while let Some(signal) = rx.recv().await {
            if self.token.is_cancelled() {
                break;
            }
            self.emit(signal).await;
            drained += 1;
        }
        debug!(operation = %self.operation, drained, "metrics queue drained");
    }

    async fn emit(&self, signal: Signal) {
        let snapshot = match std::panic::catch_unwind(AssertUnwindSafe(|| aggregate(&self.copies))) {
            Ok(snapshot) => snapshot,
            Err(panic) => {
                error!(
                    operation = %self.operation,
                    signal = ?signal.kind,
                    copy = signal.copy,
                    panic = %panic_message(panic.as_ref()),
                    "metrics computation panicked; signal skipped"
                );
                return;
            }
        };

        let event = Event::metrics(Arc::clone(&self.operation), snapshot);
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = self.channel.send(event) => {}
        }
    }
}
