//! # SubscriberSet: push delivery over registry channels
//!
//! [`SubscriberSet`] attaches [`Subscribe`] implementations to every channel of
//! a [`ChannelRegistry`] matching their [`kind`](Subscribe::kind), and drives
//! each resulting subscription from its own worker task.
//!
//! ## What it guarantees
//! - Per-channel FIFO for each subscriber.
//! - Panics inside subscribers are caught and logged; the worker keeps going
//!   with the next event.
//!
//! ## What it does **not** guarantee
//! - No ordering across channels (a status event and a metrics event may reach
//!   the same subscriber in either order).
//!
//! ## Diagram
//! ```text
//!   attach(registry, subs)
//!        │            (one subscription per matching channel)
//!        ├──► [status  sub S1] ─► worker ─► S1.on_event()
//!        ├──► [metrics sub S1] ─► worker ─► S1.on_event()
//!        └──► [status  sub S2] ─► worker ─► S2.on_event()
//! ```
//!
//! Workers end when their channel closes, i.e. after
//! [`Operation::shutdown`](crate::Operation::shutdown) or
//! [`ChannelRegistry::close_all`].

use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::Subscribe;
use crate::aggregate::panic_message;
use crate::events::{ChannelRegistry, Subscription};

/// Worker task with the subscriber name it serves.
struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Set of push subscribers attached to one registry.
pub struct SubscriberSet {
    subscribers: usize,
    workers: Vec<Worker>,
}

impl SubscriberSet {
    /// Subscribes each of `subs` to the registry channels of its kind and
    /// spawns one worker per subscription.
    ///
    /// Must be called from within a tokio runtime. Attach **before**
    /// [`Operation::init`](crate::Operation::init), or the channels will not be
    /// wired.
    #[must_use]
    pub fn attach(registry: &ChannelRegistry, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut workers = Vec::new();

        for sub in &subs {
            let channels = registry.channels_for(sub.kind());
            debug!(
                subscriber = sub.name(),
                kind = %sub.kind(),
                channels = channels.len(),
                "subscriber attached"
            );
            for channel in channels {
                let handle = tokio::spawn(drive(Arc::clone(sub), channel.subscribe()));
                workers.push(Worker {
                    name: sub.name(),
                    handle,
                });
            }
        }

        Self {
            subscribers: subs.len(),
            workers,
        }
    }

    /// Awaits every worker.
    ///
    /// Returns once all attached channels are closed and drained.
    pub async fn shutdown(self) {
        for worker in self.workers {
            if let Err(e) = worker.handle.await {
                error!(subscriber = worker.name, error = %e, "subscriber worker failed");
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers == 0
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
    }

    /// Number of worker tasks (one per subscriber and matching channel).
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

async fn drive(sub: Arc<dyn Subscribe>, mut events: Subscription) {
    while let Some(event) = events.next().await {
        let fut = sub.on_event(&event);
        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            error!(
                subscriber = sub.name(),
                seq = event.seq,
                panic = %panic_message(panic.as_ref()),
                "subscriber panicked"
            );
        }
    }
}
