//! Adapter core: configuration and the operation composition root.
//!
//! The public API from this module is [`Operation`] (with its builder and
//! [`Wiring`] report) and [`AdapterConfig`].
//!
//! Internal modules:
//! - [`config`]: channel policies;
//! - [`builder`]: assembles an operation and its channels;
//! - [`operation`]: copy discovery, lazy wiring, read-through and teardown.

mod builder;
mod config;
mod operation;

pub use builder::OperationBuilder;
pub use config::AdapterConfig;
pub use operation::{Operation, Wiring};
