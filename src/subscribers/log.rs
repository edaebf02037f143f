//! # Tracing subscriber for debugging and demos.
//!
//! [`LogWriter`] emits every event it receives as an `info` record.
//!
//! ## Output format
//! ```text
//! [status] operation=sort-rows phase=running seq=3
//! [metrics] operation=sort-rows read=120 written=118 rejected=2 in_flight=0 seq=4
//! [status] operation=sort-rows phase=stopped seq=5
//! ```

use async_trait::async_trait;
use tracing::info;

use super::Subscribe;
use crate::events::Event;

/// Logging subscriber over `tracing`.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured export.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        info!(target: "opvisor::events", "{event}");
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use super::*;
    use crate::events::{EventKind, MetricsSnapshot, Phase};

    #[tokio::test]
    async fn test_log_writer_handles_every_kind() {
        let writer = LogWriter;
        assert_eq!(writer.name(), "log-writer");
        assert_eq!(writer.kind(), EventKind::Report);

        writer.on_event(&Event::status("sort-rows", Phase::Running)).await;
        writer
            .on_event(&Event::metrics("sort-rows", MetricsSnapshot::default()))
            .await;
        writer.on_event(&Event::status("sort-rows", Phase::Stopped)).await;
    }
}
