//! # Arrival barrier with a single-fire completion action.
//!
//! A [`Barrier`] expects a fixed number of arrivals and runs its completion
//! action exactly once, on the thread whose arrival brings the count to zero.
//!
//! ## Rules
//! - **Decrement-then-test**: each arrival atomically decrements `remaining`
//!   unless it is already zero; the arrival that observed `1` fires.
//! - **Over-arrival**: arrivals after zero return [`Arrival::Ignored`].
//! - **Zero expected**: the action runs inside [`Barrier::new`].
//! - **No timeout**: if arrivals stop short, the action never runs.
//! - **Panic isolation**: a panicking action is caught and logged; the
//!   barrier still counts as fired.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use opvisor::{Arrival, Barrier};
//!
//! let fired = Arc::new(AtomicUsize::new(0));
//! let f = fired.clone();
//! let barrier = Barrier::new(2, move || { f.fetch_add(1, Ordering::SeqCst); });
//!
//! assert_eq!(barrier.arrive(), Arrival::Counted { remaining: 1 });
//! assert_eq!(barrier.arrive(), Arrival::Completed);
//! assert_eq!(barrier.arrive(), Arrival::Ignored);
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::error;

use super::panic_message;

type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of one [`Barrier::arrive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Counted; `remaining` more arrivals are needed.
    Counted { remaining: usize },
    /// This arrival reached zero and ran the completion action.
    Completed,
    /// The barrier had already reached zero; nothing happened.
    Ignored,
}

/// Counts arrivals and fires a completion action exactly once.
pub struct Barrier {
    expected: usize,
    remaining: AtomicUsize,
    action: Mutex<Option<Completion>>,
}

impl Barrier {
    /// Creates a barrier expecting `expected` arrivals.
    ///
    /// With `expected == 0` the action runs before this returns.
    pub fn new<F>(expected: usize, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let barrier = Self {
            expected,
            remaining: AtomicUsize::new(expected),
            action: Mutex::new(Some(Box::new(action))),
        };
        if expected == 0 {
            barrier.fire();
        }
        barrier
    }

    /// Records one arrival. Safe to call from any thread.
    pub fn arrive(&self) -> Arrival {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                self.fire();
                Arrival::Completed
            }
            Ok(prev) => Arrival::Counted {
                remaining: prev - 1,
            },
            Err(_) => Arrival::Ignored,
        }
    }

    #[inline]
    pub fn expected(&self) -> usize {
        self.expected
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// True once the completion action has been taken to run.
    pub fn is_fired(&self) -> bool {
        self.action.lock().is_none()
    }

    fn fire(&self) {
        // Taken under the lock, run outside it.
        let action = self.action.lock().take();
        if let Some(action) = action {
            if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(action)) {
                error!(
                    expected = self.expected,
                    panic = %panic_message(panic.as_ref()),
                    "barrier completion action panicked"
                );
            }
        }
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("expected", &self.expected)
            .field("remaining", &self.remaining())
            .field("fired", &self.is_fired())
            .finish()
    }
}
