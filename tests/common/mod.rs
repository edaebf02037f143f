//! Recording doubles of the engine and the logical model.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use opvisor::{
    AdapterConfig, ConfigMap, CopyCounters, ExecutionEngine, Hop, LifecycleListener,
    LogicalOperation, Operation, RowListener, StepCopy,
};
use parking_lot::Mutex;
use serde_json::json;

/// Copy that updates its counters, then invokes listeners on the calling thread.
pub struct FakeCopy {
    nr: usize,
    read: AtomicU64,
    written: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    lifecycle: Mutex<Vec<Arc<dyn LifecycleListener>>>,
    rows: Mutex<Vec<Arc<dyn RowListener>>>,
}

impl FakeCopy {
    pub fn new(nr: usize) -> Arc<Self> {
        Arc::new(Self {
            nr,
            read: AtomicU64::new(0),
            written: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            lifecycle: Mutex::new(Vec::new()),
            rows: Mutex::new(Vec::new()),
        })
    }

    pub fn become_active(&self) {
        for l in self.lifecycle_listeners() {
            l.copy_active(self);
        }
    }

    pub fn finish(&self) {
        for l in self.lifecycle_listeners() {
            l.copy_finished(self);
        }
    }

    pub fn read_row(&self) {
        self.read.fetch_add(1, Ordering::SeqCst);
        for l in self.row_listeners() {
            l.row_read(self);
        }
    }

    pub fn write_row(&self) {
        self.written.fetch_add(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
        for l in self.row_listeners() {
            l.row_written(self);
        }
    }

    pub fn reject_row(&self) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
        for l in self.row_listeners() {
            l.error_row_written(self);
        }
    }

    /// Listeners registered on this copy, of both kinds.
    pub fn registrations(&self) -> usize {
        self.lifecycle.lock().len() + self.rows.lock().len()
    }

    fn lifecycle_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        self.lifecycle.lock().clone()
    }

    fn row_listeners(&self) -> Vec<Arc<dyn RowListener>> {
        self.rows.lock().clone()
    }
}

impl StepCopy for FakeCopy {
    fn copy_nr(&self) -> usize {
        self.nr
    }

    fn add_lifecycle_listener(&self, listener: Arc<dyn LifecycleListener>) {
        self.lifecycle.lock().push(listener);
    }

    fn add_row_listener(&self, listener: Arc<dyn RowListener>) {
        self.rows.lock().push(listener);
    }

    fn counters(&self) -> CopyCounters {
        CopyCounters {
            lines_read: self.read.load(Ordering::SeqCst),
            lines_written: self.written.load(Ordering::SeqCst),
            lines_rejected: self.rejected.load(Ordering::SeqCst),
            processed: self.processed.load(Ordering::SeqCst),
        }
    }
}

/// Engine with a fixed set of copies for any operation id.
pub struct FakeEngine {
    copies: Vec<Arc<FakeCopy>>,
    lookups: AtomicUsize,
}

impl FakeEngine {
    pub fn with_copies(n: usize) -> Arc<Self> {
        Arc::new(Self {
            copies: (0..n).map(FakeCopy::new).collect(),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn copy(&self, nr: usize) -> Arc<FakeCopy> {
        Arc::clone(&self.copies[nr])
    }

    /// Total listener registrations across all copies.
    pub fn registrations(&self) -> usize {
        self.copies.iter().map(|c| c.registrations()).sum()
    }

    /// Number of `copies()` calls.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ExecutionEngine for FakeEngine {
    fn copies(&self, _operation_id: &str) -> Vec<Arc<dyn StepCopy>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.copies
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn StepCopy>)
            .collect()
    }
}

/// Logical operation `merge-rows` between `read-a` and `write-out`.
pub struct FakeStep {
    config: ConfigMap,
}

impl FakeStep {
    pub fn new() -> Arc<Self> {
        let mut config = ConfigMap::new();
        config.insert("batch".into(), json!(500));
        Arc::new(Self { config })
    }
}

impl LogicalOperation for FakeStep {
    fn id(&self) -> &str {
        "merge-rows"
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn inputs(&self) -> Vec<String> {
        vec!["read-a".into()]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["write-out".into()]
    }

    fn hops_in(&self) -> Vec<Hop> {
        vec![Hop::new("read-a", "merge-rows")]
    }

    fn hops_out(&self) -> Vec<Hop> {
        vec![Hop::new("merge-rows", "write-out")]
    }
}

pub fn operation(engine: &Arc<FakeEngine>) -> Operation {
    Operation::new(FakeStep::new(), Arc::clone(engine) as Arc<dyn ExecutionEngine>)
}

pub fn operation_with(engine: &Arc<FakeEngine>, cfg: AdapterConfig) -> Operation {
    Operation::builder(FakeStep::new(), Arc::clone(engine) as Arc<dyn ExecutionEngine>)
        .with_config(cfg)
        .build()
}
