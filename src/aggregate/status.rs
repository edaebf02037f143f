//! # Status aggregation over all copies of an operation.
//!
//! ```text
//! copy 1 ─┐ copy_active()     ┌─────────────────────┐
//! copy 2 ─┼──────────────────►│ running: Barrier(N) │──► publish(Running)
//! copy N ─┘                   └─────────────────────┘
//! copy 1 ─┐ copy_finished()   ┌─────────────────────┐
//! copy 2 ─┼──────────────────►│ stopped: Barrier(N) │──► publish(Stopped)
//! copy N ─┘                   └─────────────────────┘
//! ```
//!
//! Each phase is published at most once, from the engine thread whose
//! callback completed the barrier. Ordering between `Running` and `Stopped`
//! follows the engine's own ordering of callbacks.

use std::sync::Arc;

use tracing::{debug, trace};

use super::barrier::{Arrival, Barrier};
use crate::engine::{LifecycleListener, StepCopy};
use crate::events::{Channel, Event, Phase};

/// Turns per-copy lifecycle callbacks into one `Running` and one `Stopped` event.
#[derive(Debug)]
pub struct StatusAggregator {
    operation: Arc<str>,
    running: Barrier,
    stopped: Barrier,
}

impl StatusAggregator {
    /// Creates the aggregator for `copies` copies, publishing on `channel`.
    ///
    /// With zero copies both phases are published immediately, `Running` first.
    pub fn new(operation: Arc<str>, copies: usize, channel: Channel) -> Self {
        Self {
            running: Self::phase_barrier(&operation, copies, channel.clone(), Phase::Running),
            stopped: Self::phase_barrier(&operation, copies, channel, Phase::Stopped),
            operation,
        }
    }

    fn phase_barrier(operation: &Arc<str>, copies: usize, channel: Channel, phase: Phase) -> Barrier {
        let operation = Arc::clone(operation);
        Barrier::new(copies, move || {
            debug!(operation = %operation, phase = phase.as_label(), "all copies reported");
            channel.publish(Event::status(operation, phase));
        })
    }

    /// Records that one copy became active.
    pub fn arrive_active(&self) -> Arrival {
        self.running.arrive()
    }

    /// Records that one copy finished.
    pub fn arrive_finished(&self) -> Arrival {
        self.stopped.arrive()
    }

    #[inline]
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl LifecycleListener for StatusAggregator {
    fn copy_active(&self, copy: &dyn StepCopy) {
        let arrival = self.arrive_active();
        trace!(operation = %self.operation, copy = copy.copy_nr(), ?arrival, "copy active");
    }

    fn copy_finished(&self, copy: &dyn StepCopy) {
        let arrival = self.arrive_finished();
        trace!(operation = %self.operation, copy = copy.copy_nr(), ?arrival, "copy finished");
    }
}
