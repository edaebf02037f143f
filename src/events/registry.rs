//! # Kind-keyed channel registry.
//!
//! [`ChannelRegistry`] maps each [`EventKind`] to one [`Channel`] and answers
//! polymorphic lookups: asking for a kind returns the channels of that kind
//! **and of every kind below it**, in registration order.
//!
//! ```text
//! register(Status,  ch_s)
//! register(Metrics, ch_m)
//!
//! channels_for(Report)  → [ch_s, ch_m]   (ancestor: both)
//! channels_for(Metrics) → [ch_m]         (exact)
//! channels_for(Status)  → [ch_s]
//! ```
//!
//! Each returned channel stays a separate stream; nothing is merged.

use parking_lot::RwLock;

use super::channel::Channel;
use super::kind::EventKind;

/// Registry of channels by event kind.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    entries: RwLock<Vec<(EventKind, Channel)>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel` under `kind`.
    ///
    /// Re-registering a kind replaces its channel in place (keeping its
    /// position) and returns the previous one.
    pub fn register(&self, kind: EventKind, channel: Channel) -> Option<Channel> {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, slot)) => Some(std::mem::replace(slot, channel)),
            None => {
                entries.push((kind, channel));
                None
            }
        }
    }

    /// Channels whose registered kind is `requested` or a descendant of it.
    ///
    /// Unknown or unrelated kinds yield an empty vector.
    pub fn channels_for(&self, requested: EventKind) -> Vec<Channel> {
        self.entries
            .read()
            .iter()
            .filter(|(kind, _)| kind.is_a(requested))
            .map(|(_, ch)| ch.clone())
            .collect()
    }

    /// Channel registered under exactly `kind`.
    pub fn channel(&self, kind: EventKind) -> Option<Channel> {
        self.entries
            .read()
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ch)| ch.clone())
    }

    /// All registered kinds, in registration order.
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        self.entries.read().iter().map(|(kind, _)| *kind).collect()
    }

    /// Closes every registered channel.
    pub fn close_all(&self) {
        for (_, ch) in self.entries.read().iter() {
            ch.close();
        }
    }
}
