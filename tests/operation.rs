mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use opvisor::{
    AdapterConfig, BackpressurePolicy, Event, EventKind, MetricsSnapshot, Operation, Phase,
    Subscribe, SubscriberSet, Wiring,
};
use parking_lot::Mutex;
use tokio::time::timeout;

use common::{FakeEngine, operation, operation_with};

const WAIT: Duration = Duration::from_secs(5);

async fn next(sub: &mut opvisor::Subscription) -> Event {
    timeout(WAIT, sub.recv())
        .await
        .expect("event within timeout")
        .expect("stream still open")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_running_published_once_after_last_copy() {
    let engine = FakeEngine::with_copies(3);
    let op = operation(&engine);
    let mut status = op.subscribe_status();

    let wiring = op.init().unwrap();
    assert_eq!(
        wiring,
        Wiring {
            copies: 3,
            status: true,
            metrics: false
        }
    );
    assert_eq!(engine.registrations(), 3);

    engine.copy(0).become_active();
    engine.copy(1).become_active();
    assert!(status.recv().now_or_never().is_none());

    let third = engine.copy(2);
    std::thread::spawn(move || third.become_active())
        .join()
        .unwrap();
    assert_eq!(next(&mut status).await.phase(), Some(Phase::Running));

    // repeated activation never re-fires
    engine.copy(0).become_active();
    assert!(status.recv().now_or_never().is_none());

    op.shutdown().await;
    assert!(status.recv().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_lifecycle_emits_each_phase_once() {
    let engine = FakeEngine::with_copies(6);
    let op = operation(&engine);
    let mut status = op.subscribe_status();
    op.init().unwrap();

    let start = Arc::new(std::sync::Barrier::new(6));
    let threads: Vec<_> = (0..6)
        .map(|nr| {
            let copy = engine.copy(nr);
            let start = Arc::clone(&start);
            std::thread::spawn(move || {
                start.wait();
                copy.become_active();
                copy.finish();
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    op.shutdown().await;

    let mut phases = Vec::new();
    while let Some(ev) = status.recv().await {
        phases.push(ev.phase().unwrap());
    }
    assert_eq!(phases, vec![Phase::Running, Phase::Stopped]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_metrics_snapshots_are_monotonic_under_concurrency() {
    let engine = FakeEngine::with_copies(2);
    let op = operation(&engine);
    let mut metrics = op.subscribe_metrics();

    let wiring = op.init().unwrap();
    assert!(wiring.metrics && !wiring.status);
    assert_eq!(engine.registrations(), 2);

    let a = engine.copy(0);
    let b = engine.copy(1);
    let ta = std::thread::spawn(move || (0..10).for_each(|_| a.read_row()));
    let tb = std::thread::spawn(move || (0..5).for_each(|_| b.write_row()));
    ta.join().unwrap();
    tb.join().unwrap();

    let mut prev = MetricsSnapshot::default();
    for _ in 0..15 {
        let ev = next(&mut metrics).await;
        assert_eq!(ev.kind(), EventKind::Metrics);
        assert_eq!(&*ev.operation, "merge-rows");
        let snap = *ev.snapshot().unwrap();
        assert!(snap.dominates(&prev), "{snap:?} after {prev:?}");
        prev = snap;
    }
    assert_eq!(
        prev,
        MetricsSnapshot {
            lines_read: 10,
            lines_written: 5,
            lines_rejected: 0,
            lines_in_flight: 5,
        }
    );

    op.shutdown().await;
    assert!(metrics.recv().await.is_none());
}

#[tokio::test]
async fn test_shutdown_publishes_final_totals() {
    let engine = FakeEngine::with_copies(1);
    let op = operation(&engine);
    let mut metrics = op.subscribe_metrics();
    op.init().unwrap();

    let copy = engine.copy(0);
    for _ in 0..100 {
        copy.read_row();
    }
    op.shutdown().await;

    let mut delivered = Vec::new();
    while let Some(ev) = metrics.recv().await {
        delivered.push(*ev.snapshot().unwrap());
    }
    assert_eq!(delivered.len(), 100);
    assert_eq!(delivered.last().map(|s| s.lines_read), Some(100));

    // queue closed: later rows publish nothing
    copy.read_row();
    assert!(metrics.recv().await.is_none());
}

#[tokio::test]
async fn test_rejected_rows_are_counted() {
    let engine = FakeEngine::with_copies(1);
    let op = operation(&engine);
    let mut metrics = op.subscribe_metrics();
    op.init().unwrap();

    let copy = engine.copy(0);
    copy.read_row();
    copy.read_row();
    copy.reject_row();

    let mut last = MetricsSnapshot::default();
    for _ in 0..3 {
        last = *next(&mut metrics).await.snapshot().unwrap();
    }
    assert_eq!(last.lines_rejected, 1);
    assert_eq!(last.lines_in_flight, 1);

    op.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribed_operation_wires_nothing() {
    let engine = FakeEngine::with_copies(4);
    let op = operation(&engine);

    let wiring = op.init().unwrap();
    assert_eq!(
        wiring,
        Wiring {
            copies: 4,
            status: false,
            metrics: false
        }
    );
    assert_eq!(engine.registrations(), 0);

    let mut late = op.subscribe(EventKind::Report);
    assert_eq!(late.len(), 2);
    for nr in 0..4 {
        let copy = engine.copy(nr);
        copy.become_active();
        copy.read_row();
        copy.write_row();
        copy.finish();
    }

    op.shutdown().await;
    for sub in &mut late {
        assert!(sub.recv().await.is_none());
    }
}

#[tokio::test]
async fn test_second_init_registers_nothing() {
    let engine = FakeEngine::with_copies(2);
    let op = operation(&engine);
    let _status = op.subscribe_status();
    let _metrics = op.subscribe_metrics();

    op.init().unwrap();
    assert_eq!(engine.registrations(), 4);
    assert_eq!(engine.lookups(), 1);

    let err = op.init().unwrap_err();
    assert_eq!(err.as_label(), "adapter_already_initialized");
    assert_eq!(engine.registrations(), 4);
    assert_eq!(engine.lookups(), 1);

    op.shutdown().await;
}

#[tokio::test]
async fn test_report_subscriptions_are_independent() {
    let engine = FakeEngine::with_copies(1);
    let op = operation(&engine);
    let mut subs = op.subscribe(EventKind::Report);
    assert_eq!(subs.len(), 2);
    op.init().unwrap();

    let copy = engine.copy(0);
    copy.become_active();
    copy.read_row();
    copy.finish();

    let mut kinds = Vec::new();
    for sub in &mut subs {
        kinds.push(next(sub).await.kind());
    }
    kinds.sort_by_key(|k| k.as_label());
    assert_eq!(kinds, vec![EventKind::Metrics, EventKind::Status]);

    op.shutdown().await;
}

#[tokio::test]
async fn test_read_through() {
    let engine = FakeEngine::with_copies(0);
    let op = operation(&engine);

    assert_eq!(op.id(), "merge-rows");
    assert_eq!(op.config_as::<u32>("batch").unwrap(), Some(500));
    assert_eq!(op.inputs(), vec!["read-a".to_string()]);
    assert_eq!(op.outputs(), vec!["write-out".to_string()]);
    assert_eq!(op.hops_in()[0].from, "read-a");
    assert_eq!(op.hops_out()[0].to, "write-out");
    assert_eq!(op.logical().id(), op.id());
}

#[test]
fn test_configured_runtime_hosts_metrics_worker() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let engine = FakeEngine::with_copies(1);
    let op = Operation::builder(common::FakeStep::new(), engine.clone())
        .with_runtime(rt.handle().clone())
        .build();
    let mut metrics = op.subscribe_metrics();

    // no runtime is current on this thread
    assert!(op.init().unwrap().metrics);
    engine.copy(0).read_row();

    rt.block_on(async {
        let ev = next(&mut metrics).await;
        assert_eq!(ev.snapshot().unwrap().lines_read, 1);
        op.shutdown().await;
    });
}

#[tokio::test]
async fn test_latest_metrics_policy_keeps_newest() {
    let engine = FakeEngine::with_copies(1);
    let op = operation_with(&engine, AdapterConfig::default().with_latest_metrics(1));
    let mut metrics = op.subscribe_metrics();
    op.init().unwrap();

    let copy = engine.copy(0);
    for _ in 0..20 {
        copy.read_row();
    }

    // the final snapshot always survives
    let mut last = 0;
    while last < 20 {
        last = next(&mut metrics).await.snapshot().unwrap().lines_read;
    }
    assert_eq!(last, 20);

    op.shutdown().await;
}

struct Collect {
    kind: EventKind,
    events: Mutex<Vec<Event>>,
}

#[async_trait]
impl Subscribe for Collect {
    async fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "collect"
    }

    fn kind(&self) -> EventKind {
        self.kind
    }
}

#[tokio::test]
async fn test_push_subscribers_are_wired() {
    let engine = FakeEngine::with_copies(2);
    let op = operation_with(
        &engine,
        AdapterConfig {
            status_policy: BackpressurePolicy::DropLatest { capacity: 2 },
            ..AdapterConfig::default()
        },
    );
    let status = Arc::new(Collect {
        kind: EventKind::Status,
        events: Mutex::new(Vec::new()),
    });
    let set = SubscriberSet::attach(op.registry(), vec![status.clone() as Arc<dyn Subscribe>]);
    assert_eq!(set.worker_count(), 1);

    let wiring = op.init().unwrap();
    assert!(wiring.status && !wiring.metrics);

    for nr in 0..2 {
        engine.copy(nr).become_active();
    }
    for nr in 0..2 {
        engine.copy(nr).finish();
    }
    op.shutdown().await;
    timeout(WAIT, set.shutdown()).await.unwrap();

    let phases: Vec<_> = status.events.lock().iter().filter_map(Event::phase).collect();
    assert_eq!(phases, vec![Phase::Running, Phase::Stopped]);
}
