//! # Operation: composition root of the adapter.
//!
//! An [`Operation`] stands for one logical operation executed by the engine
//! as N copies. It owns the channel registry and, on [`init`](Operation::init),
//! wires aggregators into the engine's copies **only for channels that
//! already have subscribers**.
//!
//! ## Wiring
//! ```text
//! init()
//!   ├─► engine.copies(id)                         → [StepCopy; N]
//!   ├─► status.has_subscribers()?
//!   │     └─ yes: StatusAggregator(N) ──► copy.add_lifecycle_listener(..) × N
//!   └─► metrics.has_subscribers()?
//!         └─ yes: MetricsAggregator::spawn(runtime) ──► copy.add_row_listener(..) × N
//! ```
//!
//! ## Rules
//! - **Lazy**: a channel without subscribers at `init()` is never wired;
//!   subscribers that attach later receive nothing from it.
//! - **Single init**: a second `init()` fails with
//!   [`AdapterError::AlreadyInitialized`] and wires nothing.
//! - **Read-through**: identity, configuration and graph position are
//!   delegated to the [`LogicalOperation`] unchanged.
//! - **Teardown**: [`shutdown`](Operation::shutdown) drains the metrics worker
//!   and closes every channel; dropping the operation cancels the worker.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use opvisor::{ConfigMap, ExecutionEngine, LogicalOperation, Operation, StepCopy};
//!
//! struct Step { config: ConfigMap }
//! impl LogicalOperation for Step {
//!     fn id(&self) -> &str { "sort-rows" }
//!     fn config(&self) -> &ConfigMap { &self.config }
//! }
//!
//! struct NoCopies;
//! impl ExecutionEngine for NoCopies {
//!     fn copies(&self, _: &str) -> Vec<Arc<dyn StepCopy>> { Vec::new() }
//! }
//!
//! let op = Operation::new(Arc::new(Step { config: ConfigMap::new() }), Arc::new(NoCopies));
//! let wiring = op.init().unwrap();
//! assert_eq!(op.id(), "sort-rows");
//! assert!(!wiring.status && !wiring.metrics);
//! assert!(op.init().is_err());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::debug;

use super::builder::OperationBuilder;
use super::config::AdapterConfig;
use crate::aggregate::{MetricsAggregator, StatusAggregator};
use crate::engine::{ConfigMap, ExecutionEngine, Hop, LogicalOperation};
use crate::error::{AdapterError, ConfigError};
use crate::events::{Channel, ChannelRegistry, EventKind, Subscription};

/// What [`Operation::init`] wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    /// Number of copies reported by the engine.
    pub copies: usize,
    /// Lifecycle listeners were registered.
    pub status: bool,
    /// Row listeners were registered and a metrics worker spawned.
    pub metrics: bool,
}

/// State produced by `init()`; the metrics worker is owned here for teardown.
#[derive(Default)]
struct Wired {
    wiring: Option<Wiring>,
    metrics: Option<Arc<MetricsAggregator>>,
}

/// Externally observable view of one operation and its copies.
pub struct Operation {
    logical: Arc<dyn LogicalOperation>,
    engine: Arc<dyn ExecutionEngine>,
    runtime: Option<Handle>,
    registry: ChannelRegistry,
    status: Channel,
    metrics: Channel,
    shutdown_grace: Duration,
    initialized: AtomicBool,
    wired: Mutex<Wired>,
}

impl Operation {
    /// Creates an operation with default configuration.
    pub fn new(logical: Arc<dyn LogicalOperation>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::builder(logical, engine).build()
    }

    /// Starts building an operation.
    pub fn builder(
        logical: Arc<dyn LogicalOperation>,
        engine: Arc<dyn ExecutionEngine>,
    ) -> OperationBuilder {
        OperationBuilder::new(logical, engine)
    }

    pub(super) fn from_parts(
        logical: Arc<dyn LogicalOperation>,
        engine: Arc<dyn ExecutionEngine>,
        runtime: Option<Handle>,
        cfg: &AdapterConfig,
    ) -> Self {
        let status = cfg.status_channel();
        let metrics = cfg.metrics_channel();
        let registry = ChannelRegistry::new();
        registry.register(EventKind::Status, status.clone());
        registry.register(EventKind::Metrics, metrics.clone());
        Self {
            logical,
            engine,
            runtime,
            registry,
            status,
            metrics,
            shutdown_grace: cfg.shutdown_grace,
            initialized: AtomicBool::new(false),
            wired: Mutex::new(Wired::default()),
        }
    }

    /// Discovers copies and wires aggregators for channels that have subscribers.
    ///
    /// # Errors
    /// - [`AdapterError::AlreadyInitialized`] on any call after the first successful one.
    /// - [`AdapterError::NoRuntime`] if metrics must be wired and no tokio runtime
    ///   was configured or is current. Nothing is wired and `init` may be retried.
    pub fn init(&self) -> Result<Wiring, AdapterError> {
        if self.initialized.load(Ordering::Acquire) {
            return Err(self.already_initialized());
        }

        let wire_status = self.status.has_subscribers();
        let wire_metrics = self.metrics.has_subscribers();
        let runtime = if wire_metrics {
            match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
                Some(handle) => Some(handle),
                None => {
                    return Err(AdapterError::NoRuntime {
                        operation: self.id().into(),
                    });
                }
            }
        } else {
            None
        };

        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(self.already_initialized());
        }

        let operation: Arc<str> = self.id().into();
        let copies = self.engine.copies(self.id());

        let status = wire_status.then(|| {
            let agg = Arc::new(StatusAggregator::new(
                Arc::clone(&operation),
                copies.len(),
                self.status.clone(),
            ));
            for copy in &copies {
                copy.add_lifecycle_listener(agg.clone());
            }
            agg
        });

        let metrics = runtime.map(|handle| {
            let agg = Arc::new(MetricsAggregator::spawn(
                &handle,
                Arc::clone(&operation),
                copies.clone(),
                self.metrics.clone(),
            ));
            for copy in &copies {
                copy.add_row_listener(agg.clone());
            }
            agg
        });

        let wiring = Wiring {
            copies: copies.len(),
            status: status.is_some(),
            metrics: metrics.is_some(),
        };
        debug!(
            operation = %operation,
            copies = wiring.copies,
            status = wiring.status,
            metrics = wiring.metrics,
            "operation initialized"
        );

        *self.wired.lock() = Wired {
            wiring: Some(wiring),
            metrics,
        };
        Ok(wiring)
    }

    /// Drains the metrics worker and closes every registered channel.
    ///
    /// Row signals accepted before the call still produce their snapshots,
    /// within [`AdapterConfig::shutdown_grace`]; later signals are discarded.
    /// Subscriber streams end after draining what they hold. Idempotent.
    pub async fn shutdown(&self) {
        let metrics = self.wired.lock().metrics.take();
        if let Some(metrics) = metrics {
            metrics.shutdown(self.shutdown_grace).await;
        }
        self.registry.close_all();
        debug!(operation = %self.id(), "operation shut down");
    }

    /// True once `init()` has succeeded.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Result of the successful `init()`, if any.
    pub fn wiring(&self) -> Option<Wiring> {
        self.wired.lock().wiring
    }

    // ---- identity & configuration (read-through) ----

    /// Operation id, as reported by the logical model.
    #[inline]
    pub fn id(&self) -> &str {
        self.logical.id()
    }

    #[inline]
    pub fn config(&self) -> &ConfigMap {
        self.logical.config()
    }

    /// Raw configuration value; `None` if the key is absent.
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config().get(key)
    }

    /// Typed configuration value.
    ///
    /// Absent keys yield `Ok(None)`; a present value of the wrong shape yields
    /// [`ConfigError::InvalidType`].
    pub fn config_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.config_value(key) {
            None => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| ConfigError::InvalidType {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Underlying logical model element.
    #[inline]
    pub fn logical(&self) -> &Arc<dyn LogicalOperation> {
        &self.logical
    }

    pub fn inputs(&self) -> Vec<String> {
        self.logical.inputs()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.logical.outputs()
    }

    pub fn hops_in(&self) -> Vec<Hop> {
        self.logical.hops_in()
    }

    pub fn hops_out(&self) -> Vec<Hop> {
        self.logical.hops_out()
    }

    // ---- event channels ----

    #[inline]
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Kinds this operation publishes.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.registry.registered_kinds()
    }

    /// Channels of `kind` and of every kind below it.
    pub fn channels_for(&self, kind: EventKind) -> Vec<Channel> {
        self.registry.channels_for(kind)
    }

    /// One independent subscription per channel matching `kind`.
    ///
    /// Subscribe **before** [`init`](Operation::init) for events to be wired.
    pub fn subscribe(&self, kind: EventKind) -> Vec<Subscription> {
        self.channels_for(kind)
            .iter()
            .map(Channel::subscribe)
            .collect()
    }

    /// Subscribes to the status channel.
    pub fn subscribe_status(&self) -> Subscription {
        self.status.subscribe()
    }

    /// Subscribes to the metrics channel.
    pub fn subscribe_metrics(&self) -> Subscription {
        self.metrics.subscribe()
    }

    fn already_initialized(&self) -> AdapterError {
        AdapterError::AlreadyInitialized {
            operation: self.id().into(),
        }
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        if let Some(metrics) = &self.wired.get_mut().metrics {
            metrics.cancel();
        }
    }
}
