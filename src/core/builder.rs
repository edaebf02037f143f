use std::sync::Arc;

use tokio::runtime::Handle;

use super::{config::AdapterConfig, operation::Operation};
use crate::engine::{ExecutionEngine, LogicalOperation};

/// Builder for constructing an [`Operation`] with optional settings.
pub struct OperationBuilder {
    logical: Arc<dyn LogicalOperation>,
    engine: Arc<dyn ExecutionEngine>,
    cfg: AdapterConfig,
    runtime: Option<Handle>,
}

impl OperationBuilder {
    /// Creates a new builder with default configuration.
    pub fn new(logical: Arc<dyn LogicalOperation>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            logical,
            engine,
            cfg: AdapterConfig::default(),
            runtime: None,
        }
    }

    /// Sets channel backpressure policies and the shutdown grace.
    pub fn with_config(mut self, cfg: AdapterConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the runtime that hosts the metrics worker.
    ///
    /// Without it, `init()` uses the runtime current on the calling thread.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the operation and registers its status and metrics channels.
    pub fn build(self) -> Operation {
        Operation::from_parts(self.logical, self.engine, self.runtime, &self.cfg)
    }
}
