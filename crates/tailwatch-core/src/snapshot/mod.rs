// ── Capture snapshot sources ──
//
// The engine never talks to the radio. It reads point-in-time snapshots
// through `SnapshotSource`, whose only production implementation reads
// the capture tool's SQLite database. Methods are blocking; the service
// calls them from `spawn_blocking`.

pub mod kismet;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{DeviceIdentity, TrackPoint};

pub use kismet::KismetSource;

/// One raw device row from a capture snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub identity: DeviceIdentity,
    /// Free-form transport/type string from the capture tool.
    pub kind: String,
    /// Epoch seconds.
    pub first_seen: i64,
    /// Epoch seconds.
    pub last_seen: i64,
    pub traffic_bytes: i64,
    /// Nested JSON blob describing the device, if the tool recorded one.
    pub metadata: Option<String>,
}

/// Read-only access to the latest capture snapshot.
pub trait SnapshotSource: Send + Sync {
    /// Human-readable location, for logs and error messages.
    fn describe(&self) -> String;

    /// Up to `limit` rows ordered by `last_seen` descending.
    ///
    /// Returns [`CoreError::NoSnapshot`] when nothing has been captured
    /// yet, which is distinct from a snapshot with zero devices.
    fn latest(&self, limit: usize) -> Result<Vec<CaptureRecord>, CoreError>;

    /// Positional aggregates for one device; empty when the snapshot has
    /// no position data for it.
    fn track(&self, identity: &DeviceIdentity) -> Result<Vec<TrackPoint>, CoreError>;

    /// Every device identity present in the snapshot, regardless of type.
    fn identities(&self) -> Result<Vec<DeviceIdentity>, CoreError>;
}

/// Epoch seconds to UTC; out-of-range values degrade to the epoch.
pub(crate) fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

// ── In-memory source ─────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    rows: Option<Vec<CaptureRecord>>,
    tracks: HashMap<DeviceIdentity, Vec<TrackPoint>>,
}

/// Snapshot source backed by rows held in memory.
///
/// Useful for embedding the engine behind another capture pipeline, and
/// for tests. Starts with no snapshot until rows are supplied.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

impl MemorySource {
    /// A source with no snapshot available.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose snapshot holds `rows`.
    pub fn with_rows(rows: Vec<CaptureRecord>) -> Self {
        let source = Self::new();
        source.replace(rows);
        source
    }

    /// Swap in a new snapshot.
    pub fn replace(&self, rows: Vec<CaptureRecord>) {
        self.lock().rows = Some(rows);
    }

    /// Drop the snapshot, as if the capture database disappeared.
    pub fn clear(&self) {
        self.lock().rows = None;
    }

    /// Attach positional aggregates for a device.
    pub fn set_track(&self, identity: DeviceIdentity, points: Vec<TrackPoint>) {
        self.lock().tracks.insert(identity, points);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn no_snapshot(&self) -> CoreError {
        CoreError::NoSnapshot {
            location: self.describe(),
        }
    }
}

impl SnapshotSource for MemorySource {
    fn describe(&self) -> String {
        "in-memory snapshot".into()
    }

    fn latest(&self, limit: usize) -> Result<Vec<CaptureRecord>, CoreError> {
        let mut rows = self.lock().rows.clone().ok_or_else(|| self.no_snapshot())?;
        rows.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        rows.truncate(limit);
        Ok(rows)
    }

    fn track(&self, identity: &DeviceIdentity) -> Result<Vec<TrackPoint>, CoreError> {
        let state = self.lock();
        if state.rows.is_none() {
            return Err(self.no_snapshot());
        }
        Ok(state.tracks.get(identity).cloned().unwrap_or_default())
    }

    fn identities(&self) -> Result<Vec<DeviceIdentity>, CoreError> {
        let state = self.lock();
        let rows = state.rows.as_ref().ok_or_else(|| self.no_snapshot())?;
        Ok(rows.iter().map(|r| r.identity.clone()).collect())
    }
}
