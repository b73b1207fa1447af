//! Most-recent reading per peer.
//!
//! Entries are keyed by the transport sender, not by the id in the message
//! body, and are never evicted: node churn in a small mesh is low and each
//! entry is a few dozen bytes. Only the display view is bounded.
//!
//! Display order is key order (ascending sender number), not recency.

use super::reading::{PeerReading, PeerValues};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Cache shared between the receive path and the display.
pub type SharedPeerCache = Arc<Mutex<PeerCache>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PeerEntry {
    /// Transport node number the packet came from.
    pub sender: u32,
    /// Short id carried in the message body.
    pub node_id: String,
    pub values: PeerValues,
    /// Local monotonic receive time; only used for "Ns ago".
    pub received_at_ms: u64,
}

impl PeerEntry {
    pub fn age_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.received_at_ms) / 1000
    }
}

/// Bounded view of the cache for one display frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySnapshot {
    pub entries: Vec<PeerEntry>,
    /// Entries that did not fit (`total - max` when positive).
    pub hidden: usize,
}

#[derive(Debug, Default)]
pub struct PeerCache {
    entries: BTreeMap<u32, PeerEntry>,
}

impl PeerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedPeerCache {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Insert or overwrite the entry for `sender`. Last write wins, even if the
    /// packet is older than what is cached.
    pub fn upsert(&mut self, sender: u32, reading: PeerReading, now_ms: u64) {
        self.entries.insert(
            sender,
            PeerEntry {
                sender,
                node_id: reading.node_id,
                values: reading.values,
                received_at_ms: now_ms,
            },
        );
    }

    pub fn get(&self, sender: u32) -> Option<&PeerEntry> {
        self.entries.get(&sender)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `max_count` entries in key order plus the number left out.
    pub fn snapshot_for_display(&self, max_count: usize) -> DisplaySnapshot {
        DisplaySnapshot {
            entries: self.entries.values().take(max_count).cloned().collect(),
            hidden: self.entries.len().saturating_sub(max_count),
        }
    }
}
