//! # Push-style subscriber trait
//!
//! `Subscribe` is the extension point for handling operation events without
//! polling a [`Subscription`](crate::Subscription) by hand. Each subscriber is
//! driven by dedicated worker tasks owned by the
//! [`SubscriberSet`](crate::SubscriberSet), one per matching channel.
//!
//! ## Contract
//! - Implementations may be slow; backpressure is decided by the policy of the
//!   channel they are attached to, not by the subscriber.
//! - [`Subscribe::kind`] selects channels through kind ancestry: the default
//!   [`EventKind::Report`] receives status and metrics events.
//!
//! ## Example (skeleton)
//! ```rust
//! use opvisor::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, event: &Event) {
//!         let _ = event; // write audit record...
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//!     fn kind(&self) -> EventKind { EventKind::Status }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Kind of events to receive, including every kind below it.
    fn kind(&self) -> EventKind {
        EventKind::Report
    }
}
