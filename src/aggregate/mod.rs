//! # Aggregation of per-copy callbacks into operation-level events.
//!
//! - [`Barrier`] counts arrivals and fires a completion action exactly once.
//! - [`StatusAggregator`] uses two barriers to publish `Running` / `Stopped`.
//! - [`MetricsAggregator`] serializes row signals through one worker task and
//!   publishes cumulative [`MetricsSnapshot`](crate::MetricsSnapshot)s.

mod barrier;
mod metrics;
mod status;

use std::any::Any;

pub use barrier::{Arrival, Barrier};
pub use metrics::{MetricsAggregator, RowSignal, aggregate};
pub use status::StatusAggregator;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
