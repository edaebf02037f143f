//! # External collaborators.
//!
//! The adapter does not run anything itself. It talks to two outside systems
//! through the traits in this module:
//!
//! - the **execution engine** ([`ExecutionEngine`], [`StepCopy`]) which owns
//!   worker copies and invokes [`LifecycleListener`] / [`RowListener`]
//!   callbacks from their threads;
//! - the **logical model** ([`LogicalOperation`]) which supplies identity,
//!   configuration and graph position.
//!
//! ```text
//! ExecutionEngine::copies(op_id) ──► [StepCopy; N]
//!                                       │ add_lifecycle_listener / add_row_listener
//!                                       ▼
//!                        copy threads ──► listener callbacks (concurrent, unordered)
//! ```

mod copy;
mod model;

use std::sync::Arc;

pub use copy::{CopyCounters, LifecycleListener, RowListener, StepCopy};
pub use model::{ConfigMap, Hop, LogicalOperation};

/// Execution engine running operations as parallel copies.
pub trait ExecutionEngine: Send + Sync + 'static {
    /// Copies currently belonging to the operation with id `operation_id`.
    fn copies(&self, operation_id: &str) -> Vec<Arc<dyn StepCopy>>;
}
