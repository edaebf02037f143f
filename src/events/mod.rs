//! Reporting events: types, channels and the kind registry.
//!
//! This module groups the event **data model**, the multicast **channel** used
//! to deliver events to subscribers, and the **registry** that maps kinds to
//! channels with ancestor-inclusive lookup.
//!
//! ## Contents
//! - [`EventKind`] kind tags and their declared hierarchy
//! - [`Event`], [`Payload`], [`Phase`], [`MetricsSnapshot`] event payloads
//! - [`Channel`], [`Subscription`] multicast conduit and its streams
//! - [`BackpressurePolicy`] per-channel slow-subscriber handling
//! - [`ChannelRegistry`] kind → channel map
//!
//! ## Quick reference
//! - **Publishers**: `StatusAggregator` (barrier completions, engine threads),
//!   `MetricsAggregator` (its serial worker task).
//! - **Consumers**: external pull streams via [`Channel::subscribe`], and
//!   push subscribers driven by [`SubscriberSet`](crate::SubscriberSet).

mod channel;
mod event;
mod kind;
mod policy;
mod registry;

pub use channel::{Channel, Subscription};
pub use event::{Event, MetricsSnapshot, Payload, Phase};
pub use kind::EventKind;
pub use policy::BackpressurePolicy;
pub use registry::ChannelRegistry;
