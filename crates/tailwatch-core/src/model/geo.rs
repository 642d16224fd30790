// ── Location types ──

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use tailwatch_api::NetworkRecord;

/// Approximate location of a named network, as cached by the geo lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub last_update: Option<DateTime<Utc>>,
}

impl GeoLocation {
    /// Normalize a WiGLE record. Records without trilateration carry no
    /// usable location and yield `None`.
    pub fn from_record(record: &NetworkRecord) -> Option<Self> {
        Some(Self {
            latitude: record.trilat?,
            longitude: record.trilong?,
            city: known_or_unknown(record.city.as_deref()),
            country: known_or_unknown(record.country.as_deref()),
            last_update: record.lastupdt.as_deref().and_then(parse_timestamp),
        })
    }
}

/// A network returned by an area search around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyNetwork {
    pub ssid: String,
    pub bssid: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub encryption: String,
    pub channel: Option<u32>,
    pub last_update: Option<DateTime<Utc>>,
    pub kind: String,
}

impl From<NetworkRecord> for NearbyNetwork {
    fn from(r: NetworkRecord) -> Self {
        Self {
            ssid: r.ssid.unwrap_or_else(|| "Hidden".into()),
            bssid: r.netid.unwrap_or_default(),
            latitude: r.trilat,
            longitude: r.trilong,
            encryption: known_or_unknown(r.encryption.as_deref()),
            channel: r.channel,
            last_update: r.lastupdt.as_deref().and_then(parse_timestamp),
            kind: r.kind.unwrap_or_else(|| "WiFi".into()),
        }
    }
}

/// Positional aggregate for a device from the capture database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

fn known_or_unknown(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_owned(),
        _ => "Unknown".into(),
    }
}

/// WiGLE emits RFC 3339 on the v2 API and `YYYY-MM-DD HH:MM:SS` on older
/// records.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
