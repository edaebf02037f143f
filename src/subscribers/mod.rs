//! # Push-style event subscribers.
//!
//! Pull consumers read a [`Subscription`](crate::Subscription) directly.
//! This module adds the push side: implement [`Subscribe`] and attach it with
//! [`SubscriberSet::attach`].
//!
//! ```text
//!   Operation ── channels_for(sub.kind()) ──► [Channel; K]
//!                                                │ subscribe() × K
//!                                                ▼
//!                                      worker ─► Subscribe::on_event(&Event)
//! ```
//!
//! With the `logging` feature, [`LogWriter`] traces every event it receives.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
