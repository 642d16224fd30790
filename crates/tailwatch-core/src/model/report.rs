// ── Classification output types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{DeviceProfile, ProfileField};

/// One pass's sighting of a device, as kept in the history ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub duration_secs: i64,
    pub traffic_bytes: u64,
    /// When the pass that produced this entry ran.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_profile(profile: &DeviceProfile, recorded_at: DateTime<Utc>) -> Self {
        Self {
            first_seen: profile.first_seen,
            last_seen: profile.last_seen,
            duration_secs: profile.duration_secs(),
            traffic_bytes: profile.traffic_bytes,
            recorded_at,
        }
    }
}

/// A device profile with its classification for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDevice {
    #[serde(flatten)]
    pub profile: DeviceProfile,
    pub duration_secs: i64,
    /// Number of passes (including this one) that recorded the device.
    pub appearances: u64,
    pub is_persistent: bool,
    /// Whole minutes since the device was last seen, relative to the pass.
    pub age_minutes: i64,
    pub is_following: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_fields: Vec<ProfileField>,
}

/// Result of one classification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceReport {
    /// Devices in the batch after deny-list filtering, before truncation.
    pub total_devices: usize,
    /// The most recently updated devices, capped at the report limit.
    pub devices: Vec<ClassifiedDevice>,
    /// Every following candidate of this pass.
    pub following: Vec<ClassifiedDevice>,
    /// Distinct devices ever flagged as following by this service.
    pub following_total: usize,
    pub analyzed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SurveillanceReport {
    /// Zero-valued report annotated with why the pass could not run.
    pub fn failed(error: impl Into<String>, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            total_devices: 0,
            devices: Vec::new(),
            following: Vec::new(),
            following_total: 0,
            analyzed_at,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Number of listed devices currently classified as persistent.
    pub fn persistent_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_persistent).count()
    }
}
