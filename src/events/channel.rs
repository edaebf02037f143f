//! # Multicast channel with an explicit backpressure policy.
//!
//! [`Channel`] fans every published [`Event`] out to all current subscribers.
//! Each [`subscribe`](Channel::subscribe) call creates an **independent**
//! [`Subscription`] stream that only sees events published after it was created.
//!
//! ## Architecture
//! ```text
//! publish(ev) ──► Channel ──┬──► [queue S1] ──► Subscription 1 (Stream)
//!  (one writer)   (policy)  ├──► [queue S2] ──► Subscription 2 (Stream)
//!                           └──► [queue SN] ──► Subscription N (Stream)
//! ```
//!
//! ## Rules
//! - **No subscribers**: `publish()` is a no-op; nothing is retained.
//! - **Per-subscriber FIFO**: each subscription sees events in publish order.
//! - **Non-blocking**: `publish()` returns immediately unless the policy is
//!   [`BackpressurePolicy::Block`].
//! - **Closing**: [`close`](Channel::close) drops every queue sender; streams
//!   finish after draining what they already hold. Later subscriptions are empty.
//! - **Pruning**: dropped subscriptions are forgotten on the next publish or count.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, ReceiverStream, UnboundedReceiverStream};
use tracing::{debug, warn};

use super::event::Event;
use super::policy::BackpressurePolicy;

/// Subscriber queues, shaped by the policy.
#[derive(Debug)]
enum Fanout {
    Unbounded(Vec<mpsc::UnboundedSender<Event>>),
    Bounded {
        capacity: usize,
        senders: Vec<mpsc::Sender<Event>>,
    },
    Ring(broadcast::Sender<Event>),
    Closed,
}

impl Fanout {
    fn new(policy: BackpressurePolicy) -> Self {
        match policy {
            BackpressurePolicy::Buffer => Fanout::Unbounded(Vec::new()),
            BackpressurePolicy::DropOldest { capacity } => {
                let (tx, _rx) = broadcast::channel(capacity.max(1));
                Fanout::Ring(tx)
            }
            BackpressurePolicy::DropLatest { capacity } | BackpressurePolicy::Block { capacity } => {
                Fanout::Bounded {
                    capacity: capacity.max(1),
                    senders: Vec::new(),
                }
            }
        }
    }
}

/// Buffered multicast conduit for one event kind.
///
/// Cheap to clone: clones share the same subscriber set.
#[derive(Clone, Debug)]
pub struct Channel {
    policy: BackpressurePolicy,
    fanout: Arc<Mutex<Fanout>>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(BackpressurePolicy::default())
    }
}

impl Channel {
    /// Creates an open channel with no subscribers.
    pub fn new(policy: BackpressurePolicy) -> Self {
        Self {
            policy,
            fanout: Arc::new(Mutex::new(Fanout::new(policy))),
        }
    }

    #[inline]
    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Creates a new subscription that observes subsequent events.
    ///
    /// On a closed channel the returned stream is already finished.
    pub fn subscribe(&self) -> Subscription {
        let mut fanout = self.fanout.lock();
        let inner = match &mut *fanout {
            Fanout::Unbounded(senders) => {
                let (tx, rx) = mpsc::unbounded_channel();
                senders.push(tx);
                UnboundedReceiverStream::new(rx).boxed()
            }
            Fanout::Bounded { capacity, senders } => {
                let (tx, rx) = mpsc::channel(*capacity);
                senders.push(tx);
                ReceiverStream::new(rx).boxed()
            }
            Fanout::Ring(tx) => BroadcastStream::new(tx.subscribe())
                .filter_map(|item| {
                    future::ready(match item {
                        Ok(ev) => Some(ev),
                        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscriber lagged; oldest events dropped");
                            None
                        }
                    })
                })
                .boxed(),
            Fanout::Closed => stream::empty().boxed(),
        };
        Subscription { inner }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// - Returns immediately for every policy except `Block`.
    /// - With `Block`, waits on the calling OS thread until each subscriber has
    ///   room. Inside an async runtime context the thread cannot be parked, so
    ///   the event is offered without waiting and dropped where queues are full;
    ///   use [`send`](Channel::send) from async code.
    /// - `spawn_blocking` threads also count as runtime context here, so the
    ///   same fallback applies to them. To wait from such a thread, use
    ///   `Handle::current().block_on(channel.send(event))`.
    pub fn publish(&self, event: Event) {
        if self.policy.may_block() {
            self.publish_blocking(event);
            return;
        }

        let mut fanout = self.fanout.lock();
        match &mut *fanout {
            Fanout::Unbounded(senders) => {
                senders.retain(|tx| tx.send(event.clone()).is_ok());
            }
            Fanout::Bounded { senders, .. } => {
                senders.retain(|tx| offer(tx, &event));
            }
            Fanout::Ring(tx) => {
                let _ = tx.send(event);
            }
            Fanout::Closed => {}
        }
    }

    /// Publishes an event, awaiting room in every subscriber queue under `Block`.
    ///
    /// For the other policies this is the same as [`publish`](Channel::publish).
    pub async fn send(&self, event: Event) {
        if !self.policy.may_block() {
            self.publish(event);
            return;
        }

        let senders = self.bounded_senders();
        let mut closed = false;
        for tx in senders {
            if tx.send(event.clone()).await.is_err() {
                closed = true;
            }
        }
        if closed {
            self.prune();
        }
    }

    /// True if at least one live subscription exists.
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.prune();
        match &*self.fanout.lock() {
            Fanout::Unbounded(senders) => senders.len(),
            Fanout::Bounded { senders, .. } => senders.len(),
            Fanout::Ring(tx) => tx.receiver_count(),
            Fanout::Closed => 0,
        }
    }

    /// Closes the channel: current streams end after draining, later ones are empty.
    pub fn close(&self) {
        let prev = std::mem::replace(&mut *self.fanout.lock(), Fanout::Closed);
        if !matches!(prev, Fanout::Closed) {
            debug!(policy = self.policy.as_label(), "channel closed");
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(&*self.fanout.lock(), Fanout::Closed)
    }

    fn publish_blocking(&self, event: Event) {
        let senders = self.bounded_senders();
        let in_async_context = tokio::runtime::Handle::try_current().is_ok();
        let mut closed = false;
        for tx in senders {
            if in_async_context {
                closed |= !offer(&tx, &event);
            } else if tx.blocking_send(event.clone()).is_err() {
                closed = true;
            }
        }
        if closed {
            self.prune();
        }
    }

    /// Clones the bounded senders out of the lock so waiting never holds it.
    fn bounded_senders(&self) -> Vec<mpsc::Sender<Event>> {
        match &*self.fanout.lock() {
            Fanout::Bounded { senders, .. } => senders.clone(),
            _ => Vec::new(),
        }
    }

    fn prune(&self) {
        match &mut *self.fanout.lock() {
            Fanout::Unbounded(senders) => senders.retain(|tx| !tx.is_closed()),
            Fanout::Bounded { senders, .. } => senders.retain(|tx| !tx.is_closed()),
            Fanout::Ring(_) | Fanout::Closed => {}
        }
    }
}

/// Offers an event without waiting. Returns `false` once the subscriber is gone.
fn offer(tx: &mpsc::Sender<Event>, event: &Event) -> bool {
    match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(ev)) => {
            warn!(
                operation = %ev.operation,
                kind = %ev.kind(),
                seq = ev.seq,
                "subscriber queue full; event dropped"
            );
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Lazy stream of events from one channel.
///
/// Finite only when the channel is closed; otherwise it waits for new events
/// for as long as the channel lives.
pub struct Subscription {
    inner: BoxStream<'static, Event>,
}

impl Subscription {
    /// Receives the next event, `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.inner.next().await
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
