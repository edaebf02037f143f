//! Error types used by the operation adapter.
//!
//! This module defines two enums:
//!
//! - [`AdapterError`]: errors raised while initializing an [`Operation`](crate::Operation).
//! - [`ConfigError`]: errors raised by typed configuration reads.
//!
//! Both provide `as_label` for logs/metrics. Nothing on the event path returns
//! an error: over-arrivals, missing subscribers and unknown kinds are all
//! handled as no-ops.

use std::sync::Arc;
use thiserror::Error;

/// # Errors produced while wiring an operation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AdapterError {
    /// `init()` was already called for this operation; nothing was wired twice.
    #[error("operation '{operation}' is already initialized")]
    AlreadyInitialized {
        /// Id of the operation.
        operation: Arc<str>,
    },

    /// Metrics wiring needs a tokio runtime to host its worker and none was available.
    #[error("operation '{operation}' needs a tokio runtime to spawn its metrics worker")]
    NoRuntime {
        /// Id of the operation.
        operation: Arc<str>,
    },
}

impl AdapterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use opvisor::AdapterError;
    ///
    /// let err = AdapterError::AlreadyInitialized { operation: "step-1".into() };
    /// assert_eq!(err.as_label(), "adapter_already_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdapterError::AlreadyInitialized { .. } => "adapter_already_initialized",
            AdapterError::NoRuntime { .. } => "adapter_no_runtime",
        }
    }
}

/// # Errors produced by typed configuration reads.
///
/// An absent key is **not** an error; see
/// [`Operation::config_as`](crate::Operation::config_as).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The stored value could not be deserialized into the requested type.
    #[error("config key '{key}' has an unexpected type: {source}")]
    InvalidType {
        /// Configuration key that was read.
        key: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidType { .. } => "config_invalid_type",
        }
    }
}
