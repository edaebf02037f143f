//! # Backpressure policy for channels.
//!
//! [`BackpressurePolicy`] decides what a [`Channel`](crate::Channel) does when
//! a subscriber cannot keep up with the producer.
//!
//! | Policy        | Queue                        | When full                          |
//! |---------------|------------------------------|------------------------------------|
//! | `Buffer`      | unbounded, per subscriber    | never full (memory grows)          |
//! | `DropOldest`  | shared ring of `capacity`    | lagging subscriber skips oldest    |
//! | `DropLatest`  | bounded, per subscriber      | new event dropped for that one     |
//! | `Block`       | bounded, per subscriber      | producer waits for room            |
//!
//! `Block` is the only policy that can stall the producer; it must be chosen
//! explicitly.
//!
//! Serialized with a `policy` tag, e.g. `{"policy": "drop_oldest", "capacity": 8}`.

use serde::{Deserialize, Serialize};

/// What a channel does with events a slow subscriber has not consumed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Keep every event; per-subscriber queues grow without bound.
    #[default]
    Buffer,
    /// Keep the most recent `capacity` events; lagging subscribers skip older ones.
    DropOldest {
        /// Ring size (min 1).
        capacity: usize,
    },
    /// Keep the first `capacity` unconsumed events; newer ones are discarded.
    DropLatest {
        /// Queue size (min 1).
        capacity: usize,
    },
    /// Wait until every subscriber has room.
    Block {
        /// Queue size (min 1).
        capacity: usize,
    },
}

impl BackpressurePolicy {
    /// Queue capacity clamped to a minimum of 1, `None` for `Buffer`.
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        match *self {
            BackpressurePolicy::Buffer => None,
            BackpressurePolicy::DropOldest { capacity }
            | BackpressurePolicy::DropLatest { capacity }
            | BackpressurePolicy::Block { capacity } => Some(capacity.max(1)),
        }
    }

    /// True if publishing may wait for subscribers.
    #[inline]
    pub fn may_block(&self) -> bool {
        matches!(self, BackpressurePolicy::Block { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackpressurePolicy::Buffer => "buffer",
            BackpressurePolicy::DropOldest { .. } => "drop_oldest",
            BackpressurePolicy::DropLatest { .. } => "drop_latest",
            BackpressurePolicy::Block { .. } => "block",
        }
    }
}
