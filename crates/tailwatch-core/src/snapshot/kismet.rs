// ── Kismet capture database source ──
//
// Kismet writes one SQLite file per capture session, named
// `Kismet-<timestamp>.kismet`. We only ever read it, and we read the
// `devices` table directly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use tracing::debug;

use super::{CaptureRecord, SnapshotSource, from_epoch};
use crate::error::CoreError;
use crate::model::{DeviceIdentity, TrackPoint};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LATEST_SQL: &str = "\
    SELECT devmac, type, first_time, last_time, bytes_data, device
    FROM devices
    WHERE type LIKE '%Wi-Fi%'
       OR type LIKE '%Bluetooth%'
       OR type LIKE '%BTLE%'
       OR type LIKE '%BT%'
    ORDER BY last_time DESC
    LIMIT ?1";

const TRACK_SQL: &str = "\
    SELECT min_lat, min_lon, avg_lat, avg_lon, first_time, last_time
    FROM devices
    WHERE upper(devmac) = ?1
    LIMIT 1";

const IDENTITIES_SQL: &str = "SELECT devmac FROM devices";

/// Where to find the capture database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KismetLocation {
    /// A specific database file.
    File(PathBuf),
    /// The most recently modified `Kismet-*.kismet` file in a directory.
    Newest(PathBuf),
}

/// Snapshot source reading a Kismet SQLite database.
#[derive(Debug, Clone)]
pub struct KismetSource {
    location: KismetLocation,
}

impl KismetSource {
    pub fn new(location: KismetLocation) -> Self {
        Self { location }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(KismetLocation::File(path.into()))
    }

    pub fn newest_in(directory: impl Into<PathBuf>) -> Self {
        Self::new(KismetLocation::Newest(directory.into()))
    }

    pub fn location(&self) -> &KismetLocation {
        &self.location
    }

    /// Resolve the database file to read right now.
    ///
    /// For [`KismetLocation::Newest`] this re-scans the directory on
    /// every call, so a new capture session is picked up automatically.
    pub fn resolve_path(&self) -> Result<PathBuf, CoreError> {
        let found = match &self.location {
            KismetLocation::File(path) => path.is_file().then(|| path.clone()),
            KismetLocation::Newest(dir) => newest_capture(dir),
        };
        found.ok_or_else(|| CoreError::NoSnapshot {
            location: self.describe(),
        })
    }

    fn open(&self) -> Result<Connection, CoreError> {
        let path = self.resolve_path()?;
        debug!(path = %path.display(), "opening capture database");
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

impl SnapshotSource for KismetSource {
    fn describe(&self) -> String {
        match &self.location {
            KismetLocation::File(path) => path.display().to_string(),
            KismetLocation::Newest(dir) => dir.join("Kismet-*.kismet").display().to_string(),
        }
    }

    fn latest(&self, limit: usize) -> Result<Vec<CaptureRecord>, CoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(LATEST_SQL)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], capture_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "read capture batch");
        Ok(rows)
    }

    #[allow(clippy::float_cmp)]
    fn track(&self, identity: &DeviceIdentity) -> Result<Vec<TrackPoint>, CoreError> {
        let conn = self.open()?;
        let row = conn
            .query_row(TRACK_SQL, params![identity.as_str()], |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?.unwrap_or(0.0),
                    row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                    row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                    row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                    row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                ))
            })
            .optional()?;

        let Some((min_lat, min_lon, avg_lat, avg_lon, first, last)) = row else {
            return Ok(Vec::new());
        };
        if min_lat == 0.0 {
            return Ok(Vec::new());
        }

        Ok(vec![TrackPoint {
            latitude: non_zero_or(avg_lat, min_lat),
            longitude: non_zero_or(avg_lon, min_lon),
            first_seen: from_epoch(first),
            last_seen: from_epoch(last),
        }])
    }

    fn identities(&self) -> Result<Vec<DeviceIdentity>, CoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(IDENTITIES_SQL)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(DeviceIdentity::from).collect())
    }
}

fn capture_row(row: &Row<'_>) -> rusqlite::Result<CaptureRecord> {
    let metadata = match row.get_ref(5)? {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => None,
    };
    Ok(CaptureRecord {
        identity: DeviceIdentity::new(row.get::<_, String>(0)?),
        kind: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        first_seen: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
        last_seen: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        traffic_bytes: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        metadata,
    })
}

#[allow(clippy::float_cmp)]
fn non_zero_or(preferred: f64, fallback: f64) -> f64 {
    if preferred == 0.0 { fallback } else { preferred }
}

fn is_capture_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("Kismet-") && n.ends_with(".kismet"))
}

fn newest_capture(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_capture_file(p))
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, p)| p)
}
