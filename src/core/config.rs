//! # Adapter configuration.
//!
//! Provides [`AdapterConfig`], the settings an [`Operation`](crate::Operation)
//! uses to build its channels.
//!
//! ## Sentinel values
//! - any policy capacity of `0` is clamped to `1`
//! - `shutdown_grace = 0s` cancels the metrics worker immediately (no drain)
//!
//! ## Serialized form
//! ```json
//! { "metrics_policy": { "policy": "drop_oldest", "capacity": 64 } }
//! ```
//! Missing fields keep their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::{BackpressurePolicy, Channel};

/// Configuration for one operation adapter.
///
/// ## Field semantics
/// - `status_policy`: backpressure of the status channel (at most two events ever)
/// - `metrics_policy`: backpressure of the metrics channel (one event per row signal)
/// - `shutdown_grace`: how long `shutdown()` lets the metrics worker drain
///
/// ## Notes
/// All fields are public. The default keeps every event (`Buffer`), which can
/// grow memory without bound if a metrics subscriber stalls; pick a bounded
/// policy for long-running operations with slow consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Backpressure policy of the status channel.
    pub status_policy: BackpressurePolicy,

    /// Backpressure policy of the metrics channel.
    ///
    /// [`BackpressurePolicy::Block`] stalls only the metrics worker, never the
    /// copies: their signals are queued without bound in front of it.
    pub metrics_policy: BackpressurePolicy,

    /// Maximum time to drain queued metrics signals on shutdown.
    ///
    /// Snapshots still queued when it expires are discarded.
    pub shutdown_grace: Duration,
}

impl Default for AdapterConfig {
    /// Default configuration:
    /// - both channels `Buffer`
    /// - `shutdown_grace = 5s`
    fn default() -> Self {
        Self {
            status_policy: BackpressurePolicy::default(),
            metrics_policy: BackpressurePolicy::default(),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl AdapterConfig {
    /// Keeps only the latest `capacity` metrics snapshots for slow subscribers.
    #[inline]
    pub fn with_latest_metrics(mut self, capacity: usize) -> Self {
        self.metrics_policy = BackpressurePolicy::DropOldest { capacity };
        self
    }

    #[inline]
    pub(crate) fn status_channel(&self) -> Channel {
        Channel::new(self.status_policy)
    }

    #[inline]
    pub(crate) fn metrics_channel(&self) -> Channel {
        Channel::new(self.metrics_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffers_everything() {
        let cfg = AdapterConfig::default();
        assert_eq!(cfg.status_policy, BackpressurePolicy::Buffer);
        assert_eq!(cfg.metrics_policy, BackpressurePolicy::Buffer);
        assert_eq!(cfg.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn test_latest_metrics_policy() {
        let cfg = AdapterConfig::default().with_latest_metrics(0);
        assert_eq!(cfg.metrics_channel().policy().capacity(), Some(1));
        assert_eq!(cfg.status_channel().policy(), BackpressurePolicy::Buffer);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: AdapterConfig = serde_json::from_value(serde_json::json!({
            "metrics_policy": { "policy": "block", "capacity": 4 }
        }))
        .unwrap();
        assert_eq!(cfg.status_policy, BackpressurePolicy::Buffer);
        assert_eq!(cfg.metrics_policy, BackpressurePolicy::Block { capacity: 4 });
        assert_eq!(cfg.shutdown_grace, Duration::from_secs(5));
    }
}
