//! # Logical model of an operation.
//!
//! Identity, configuration and graph position come from the logical model and
//! are passed through unchanged. The adapter never writes to it.

use std::collections::BTreeMap;

use serde_json::Value;

/// Operation configuration: key → JSON value.
pub type ConfigMap = BTreeMap<String, Value>;

/// Directed edge between two operations of the logical graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hop {
    /// Id of the upstream operation.
    pub from: String,
    /// Id of the downstream operation.
    pub to: String,
}

impl Hop {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Logical operation as described by the model graph.
///
/// Only [`id`](LogicalOperation::id) and [`config`](LogicalOperation::config)
/// are required; graph accessors default to an isolated node.
pub trait LogicalOperation: Send + Sync + 'static {
    /// Stable operation id.
    fn id(&self) -> &str;

    /// Configuration of the operation.
    fn config(&self) -> &ConfigMap;

    /// Ids of upstream operations.
    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    /// Ids of downstream operations.
    fn outputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn hops_in(&self) -> Vec<Hop> {
        Vec::new()
    }

    fn hops_out(&self) -> Vec<Hop> {
        Vec::new()
    }
}
