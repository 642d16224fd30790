// ── Engine configuration ──
//
// Plain runtime configuration for the engine. File layering and
// credential resolution live in `tailwatch-config`, which produces one of
// these.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::history::DEFAULT_HISTORY_DEPTH;

/// Classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Appearance count at which a device becomes persistent.
    pub min_appearances: u64,
    /// A single sighting longer than this makes a device persistent.
    pub persistence: Duration,
    /// Persistent devices seen within this window are following candidates.
    pub recency: Duration,
    /// Devices listed in a report.
    pub report_limit: usize,
    /// Rows read from the snapshot per pass.
    pub batch_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_appearances: 3,
            persistence: Duration::from_secs(300),
            recency: Duration::from_secs(10 * 60),
            report_limit: 50,
            batch_limit: 1000,
        }
    }
}

/// Everything `ClassificationService` needs besides its snapshot source.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub thresholds: Thresholds,
    /// Entries kept per device in the history ledger; `0` is unbounded.
    pub history_depth: usize,
    pub denylist_path: PathBuf,
    pub allowlist_path: PathBuf,
    /// Timeout for a single network-name lookup.
    pub geo_timeout: Duration,
    /// Timeout for an area search.
    pub nearby_timeout: Duration,
    /// Geo cache entry lifetime. `None` keeps entries forever.
    pub geo_cache_ttl: Option<Duration>,
}

impl ServiceConfig {
    /// Defaults with list files under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            thresholds: Thresholds::default(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            denylist_path: data_dir.join("denylist.json"),
            allowlist_path: data_dir.join("allowlist.json"),
            geo_timeout: Duration::from_secs(5),
            nearby_timeout: Duration::from_secs(10),
            geo_cache_ttl: None,
        }
    }
}
