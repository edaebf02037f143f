//! # opvisor
//!
//! **Opvisor** turns the per-copy callbacks of a parallel execution engine
//! into operation-level event streams.
//!
//! An engine runs one logical operation as N parallel copies. Each copy
//! reports its own lifecycle and row counters; consumers want one view of the
//! operation as a whole. The crate aggregates the copies into:
//! - **status** events: `Running` once all copies are active, `Stopped` once
//!   all have finished;
//! - **metrics** events: a cumulative snapshot of the copies' row counters
//!   after every row-level signal.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//!   │  StepCopy 0  │ │  StepCopy 1  │ │  StepCopy N  │   (engine-owned)
//!   └──┬────────┬──┘ └──┬────────┬──┘ └──┬────────┬──┘
//!      │active/ │rows   │        │       │        │
//!      │finished│       │        │       │        │
//!      ▼        │       ▼        │       ▼        │
//! ┌─────────────┼──────────────────────────────┐  │
//! │ StatusAggregator: Barrier(N) × 2           │  │
//! └──────┬──────┼──────────────────────────────┘  │
//!        │      ▼               ▼                 ▼
//!        │  ┌───────────────────────────────────────────┐
//!        │  │ MetricsAggregator: queue ─► single worker │
//!        │  │        aggregate(copies) ─► snapshot      │
//!        │  └────────────────────┬──────────────────────┘
//!        ▼                       ▼
//!   ┌──────────┐           ┌──────────┐
//!   │  Status  │           │ Metrics  │    Channel (backpressure policy)
//!   │ channel  │           │ channel  │
//!   └────┬─────┘           └────┬─────┘
//!        └──────────┬───────────┘
//!                   ▼
//!       ChannelRegistry (kind ancestry: Status, Metrics ⊂ Report)
//!                   │
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!    Subscription      SubscriberSet ─► Subscribe::on_event()
//!      (pull)              (push)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Operation::new(logical, engine)   registers Status and Metrics channels
//!   │
//!   ├─► subscribe(kind) / SubscriberSet::attach(..)
//!   │
//!   ├─► init()                      wires only channels that have subscribers
//!   │     ├─ status  ─► lifecycle listener on every copy
//!   │     └─ metrics ─► row listener on every copy + worker task
//!   │
//!   └─► shutdown()                  drains the worker, closes every channel
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                               |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------------|
//! | **Adapter**       | Composition root: copy discovery, lazy wiring, read-through. | [`Operation`], [`OperationBuilder`]              |
//! | **Aggregation**   | Exactly-once barriers, serialized metrics.                   | [`Barrier`], [`StatusAggregator`], [`MetricsAggregator`] |
//! | **Events**        | Typed events, kind ancestry, backpressure.                   | [`Event`], [`EventKind`], [`Channel`], [`ChannelRegistry`] |
//! | **Subscriber API**| Push-style event handlers.                                   | [`Subscribe`], [`SubscriberSet`]                 |
//! | **Engine seam**   | What the adapter needs from an engine.                       | [`ExecutionEngine`], [`StepCopy`], [`LogicalOperation`] |
//! | **Configuration** | Channel backpressure policies.                               | [`AdapterConfig`], [`BackpressurePolicy`]        |
//! | **Errors**        | Typed adapter and configuration errors.                      | [`AdapterError`], [`ConfigError`]                |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use opvisor::{ConfigMap, ExecutionEngine, LogicalOperation, Operation, Phase, StepCopy};
//!
//! struct Step { config: ConfigMap }
//! impl LogicalOperation for Step {
//!     fn id(&self) -> &str { "dedupe" }
//!     fn config(&self) -> &ConfigMap { &self.config }
//! }
//!
//! struct Idle;
//! impl ExecutionEngine for Idle {
//!     fn copies(&self, _: &str) -> Vec<Arc<dyn StepCopy>> { Vec::new() }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let op = Operation::new(Arc::new(Step { config: ConfigMap::new() }), Arc::new(Idle));
//!     let mut status = op.subscribe_status();
//!
//!     op.init()?;
//!     op.shutdown().await;
//!
//!     // an operation without copies runs and stops immediately
//!     assert_eq!(status.recv().await.and_then(|e| e.phase()), Some(Phase::Running));
//!     assert_eq!(status.recv().await.and_then(|e| e.phase()), Some(Phase::Stopped));
//!     Ok(())
//! }
//! ```
mod aggregate;
mod core;
mod engine;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use aggregate::{
    Arrival, Barrier, MetricsAggregator, RowSignal, StatusAggregator, aggregate,
};
pub use core::{AdapterConfig, Operation, OperationBuilder, Wiring};
pub use engine::{
    ConfigMap, CopyCounters, ExecutionEngine, Hop, LifecycleListener, LogicalOperation,
    RowListener, StepCopy,
};
pub use error::{AdapterError, ConfigError};
pub use events::{
    BackpressurePolicy, Channel, ChannelRegistry, Event, EventKind, MetricsSnapshot, Payload,
    Phase, Subscription,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
