//! # Event kinds and their ancestry.
//!
//! Kinds form a small declared hierarchy. Subscribing to a kind matches that
//! kind and every kind below it:
//!
//! ```text
//! Report
//!  ├── Status    (payload: Phase)
//!  └── Metrics   (payload: MetricsSnapshot)
//! ```
//!
//! The table lives in [`EventKind::parent`]; adding a kind means adding a
//! variant and its parent there.

use std::fmt;

/// Classification of reporting events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Root of the hierarchy. No event carries this kind directly.
    Report,
    /// Operation status transitions (`Running`, `Stopped`).
    Status,
    /// Cumulative row metrics summed across copies.
    Metrics,
}

impl EventKind {
    /// Every declared kind, roots first.
    pub const ALL: [EventKind; 3] = [EventKind::Report, EventKind::Status, EventKind::Metrics];

    /// Direct ancestor of this kind, `None` for the root.
    #[inline]
    pub const fn parent(self) -> Option<EventKind> {
        match self {
            EventKind::Report => None,
            EventKind::Status | EventKind::Metrics => Some(EventKind::Report),
        }
    }

    /// True if `self` is `ancestor` or lies anywhere below it.
    ///
    /// # Example
    /// ```
    /// use opvisor::EventKind;
    ///
    /// assert!(EventKind::Metrics.is_a(EventKind::Report));
    /// assert!(EventKind::Metrics.is_a(EventKind::Metrics));
    /// assert!(!EventKind::Metrics.is_a(EventKind::Status));
    /// assert!(!EventKind::Report.is_a(EventKind::Status));
    /// ```
    pub fn is_a(self, ancestor: EventKind) -> bool {
        let mut cur = Some(self);
        while let Some(kind) = cur {
            if kind == ancestor {
                return true;
            }
            cur = kind.parent();
        }
        false
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            EventKind::Report => "report",
            EventKind::Status => "status",
            EventKind::Metrics => "metrics",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_reaches_root() {
        for kind in EventKind::ALL {
            assert!(kind.is_a(EventKind::Report), "{kind} must descend from report");
        }
    }

    #[test]
    fn test_siblings_are_unrelated() {
        assert!(!EventKind::Status.is_a(EventKind::Metrics));
        assert!(!EventKind::Metrics.is_a(EventKind::Status));
    }

    #[test]
    fn test_root_has_no_parent() {
        assert_eq!(EventKind::Report.parent(), None);
        assert_eq!(EventKind::Status.parent(), Some(EventKind::Report));
    }
}
