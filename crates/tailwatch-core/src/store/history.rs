// ── Per-device sighting ledger ──
//
// Every classification pass appends one entry per device it saw. The
// appearance count drives the repetition rule, so it must never lose an
// increment. Appends for one identity run under that identity's map
// entry lock; different identities do not contend.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;

use crate::model::{DeviceIdentity, HistoryEntry};

/// Default number of entries retained per identity.
pub const DEFAULT_HISTORY_DEPTH: usize = 64;

#[derive(Debug, Default)]
struct Ledger {
    appearances: u64,
    entries: VecDeque<HistoryEntry>,
}

/// Thread-safe sighting history keyed by device identity.
#[derive(Debug)]
pub struct HistoryStore {
    ledgers: DashMap<DeviceIdentity, Ledger>,
    /// Entries kept per identity; `0` keeps everything.
    depth: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryStore {
    pub fn new(depth: usize) -> Self {
        Self {
            ledgers: DashMap::new(),
            depth,
        }
    }

    /// Append an entry and return the identity's new appearance count.
    ///
    /// The count keeps growing after old entries are evicted.
    pub fn record(&self, identity: &DeviceIdentity, entry: HistoryEntry) -> u64 {
        let mut ledger = self.ledgers.entry(identity.clone()).or_default();
        ledger.appearances += 1;
        ledger.entries.push_back(entry);
        if self.depth > 0 {
            while ledger.entries.len() > self.depth {
                ledger.entries.pop_front();
            }
        }
        ledger.appearances
    }

    pub fn appearances(&self, identity: &DeviceIdentity) -> u64 {
        self.ledgers.get(identity).map_or(0, |l| l.appearances)
    }

    /// Duration of the most recently recorded sighting.
    pub fn latest_duration(&self, identity: &DeviceIdentity) -> Option<Duration> {
        let ledger = self.ledgers.get(identity)?;
        let secs = ledger.entries.back()?.duration_secs;
        Some(Duration::from_secs(u64::try_from(secs).unwrap_or(0)))
    }

    /// Retained entries, oldest first.
    pub fn entries(&self, identity: &DeviceIdentity) -> Vec<HistoryEntry> {
        self.ledgers
            .get(identity)
            .map(|l| l.entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct identities with at least one sighting.
    pub fn tracked(&self) -> usize {
        self.ledgers.len()
    }
}
