//! # Reporting events emitted for an operation.
//!
//! An [`Event`] carries the operation id, a typed [`Payload`] and ordering
//! metadata. The payload determines the event's [`EventKind`]:
//!
//! | Payload                        | Kind                  |
//! |--------------------------------|-----------------------|
//! | [`Payload::Status`]`(Phase)`   | [`EventKind::Status`] |
//! | [`Payload::Metrics`]`(..)`     | [`EventKind::Metrics`]|
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically across the process. Within one channel, the sole writer
//! publishes in `seq` order.
//!
//! ## Example
//! ```rust
//! use opvisor::{Event, EventKind, MetricsSnapshot, Phase};
//!
//! let ev = Event::status("read-orders", Phase::Running);
//! assert_eq!(ev.kind(), EventKind::Status);
//! assert_eq!(ev.phase(), Some(Phase::Running));
//!
//! let snap = MetricsSnapshot { lines_read: 10, ..Default::default() };
//! let ev = Event::metrics("read-orders", snap);
//! assert_eq!(ev.kind(), EventKind::Metrics);
//! assert_eq!(ev.snapshot().map(|s| s.lines_read), Some(10));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::kind::EventKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Status phase of an operation, aggregated over all of its copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Every copy has become active.
    Running,
    /// Every copy has finished.
    Stopped,
}

impl Phase {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Stopped => "stopped",
        }
    }
}

/// Row counters summed across every copy of an operation.
///
/// All fields are cumulative for the operation's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Rows read by all copies.
    pub lines_read: u64,
    /// Rows written by all copies.
    pub lines_written: u64,
    /// Rows rejected (error rows) by all copies.
    pub lines_rejected: u64,
    /// Rows read but not yet processed, per copy `read - processed` (floored at 0), summed.
    pub lines_in_flight: u64,
}

impl MetricsSnapshot {
    /// True if no cumulative counter of `self` is below the one in `prev`.
    ///
    /// `lines_in_flight` is a gauge and is not compared.
    pub fn dominates(&self, prev: &MetricsSnapshot) -> bool {
        self.lines_read >= prev.lines_read
            && self.lines_written >= prev.lines_written
            && self.lines_rejected >= prev.lines_rejected
    }
}

/// Typed content of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Aggregated status transition.
    Status(Phase),
    /// Aggregated metrics reading.
    Metrics(MetricsSnapshot),
}

/// Reporting event for one operation.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `operation`: id of the logical operation the event describes
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Operation id, as reported by the logical model.
    pub operation: Arc<str>,
    /// Event content.
    pub payload: Payload,
}

impl Event {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn new(operation: impl Into<Arc<str>>, payload: Payload) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            operation: operation.into(),
            payload,
        }
    }

    /// Creates a status event.
    #[inline]
    pub fn status(operation: impl Into<Arc<str>>, phase: Phase) -> Self {
        Self::new(operation, Payload::Status(phase))
    }

    /// Creates a metrics event.
    #[inline]
    pub fn metrics(operation: impl Into<Arc<str>>, snapshot: MetricsSnapshot) -> Self {
        Self::new(operation, Payload::Metrics(snapshot))
    }

    /// Kind derived from the payload.
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self.payload {
            Payload::Status(_) => EventKind::Status,
            Payload::Metrics(_) => EventKind::Metrics,
        }
    }

    #[inline]
    pub fn phase(&self) -> Option<Phase> {
        match self.payload {
            Payload::Status(phase) => Some(phase),
            _ => None,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        match &self.payload {
            Payload::Metrics(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Status(phase) => write!(
                f,
                "[status] operation={} phase={} seq={}",
                self.operation,
                phase.as_label(),
                self.seq
            ),
            Payload::Metrics(m) => write!(
                f,
                "[metrics] operation={} read={} written={} rejected={} in_flight={} seq={}",
                self.operation,
                m.lines_read,
                m.lines_written,
                m.lines_rejected,
                m.lines_in_flight,
                self.seq
            ),
        }
    }
}
