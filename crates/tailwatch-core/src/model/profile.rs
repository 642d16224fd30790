// ── Device profile domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::identity::DeviceIdentity;

/// Radio transport the device was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum TransportClass {
    #[strum(serialize = "wifi")]
    #[serde(rename = "wifi")]
    WiFi,
    BluetoothClassic,
    BluetoothLe,
    Unknown,
}

impl TransportClass {
    /// Classify the capture tool's free-form PHY/type string.
    ///
    /// Kismet reports e.g. `"Wi-Fi AP"`, `"Wi-Fi Client"`, `"BR/EDR"`,
    /// `"BTLE"`, or `"Bluetooth"`. LE is checked first since `"BTLE"`
    /// would otherwise match the classic `"BT"` prefix.
    pub fn from_capture(kind: &str) -> Self {
        let upper = kind.to_uppercase();
        if upper.contains("BTLE") || upper.contains("BLE") {
            Self::BluetoothLe
        } else if upper.contains("WI-FI") || upper.contains("WIFI") || upper.contains("802.11") {
            Self::WiFi
        } else if upper.contains("BLUETOOTH") || upper.contains("BR/EDR") || upper.contains("BT") {
            Self::BluetoothClassic
        } else {
            Self::Unknown
        }
    }

    pub fn is_bluetooth(self) -> bool {
        matches!(self, Self::BluetoothClassic | Self::BluetoothLe)
    }
}

/// Optional profile fields that can fail to parse independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProfileField {
    /// The whole metadata blob was not a JSON object.
    Metadata,
    Manufacturer,
    Name,
    Signal,
    Channel,
    Frequency,
    Encryption,
    Networks,
    DeviceClass,
}

/// Canonical per-snapshot view of one observed device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub identity: DeviceIdentity,
    pub transport: TransportClass,
    /// Raw capture-tool type string (e.g. `"Wi-Fi Client"`).
    pub kind: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Byte count reported by the capture tool, used as a traffic proxy.
    pub traffic_bytes: u64,
    pub manufacturer: String,
    pub name: Option<String>,
    /// Last reported signal. `None` when the tool did not report one.
    pub signal_dbm: Option<i32>,
    pub channel: Option<String>,
    pub frequency_khz: Option<f64>,
    /// Wi-Fi encryption descriptor.
    pub encryption: Option<String>,
    /// Bluetooth device class.
    pub device_class: Option<String>,
    /// Probed or advertised network names, at most five.
    pub networks: Vec<String>,
}

impl DeviceProfile {
    /// Seconds between first and last sighting within this snapshot.
    pub fn duration_secs(&self) -> i64 {
        (self.last_seen - self.first_seen).num_seconds()
    }
}

/// A profile plus the optional fields that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProfile {
    pub profile: DeviceProfile,
    pub failed_fields: Vec<ProfileField>,
}

impl ExtractedProfile {
    pub fn is_degraded(&self) -> bool {
        !self.failed_fields.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transport_from_kismet_strings() {
        assert_eq!(TransportClass::from_capture("Wi-Fi AP"), TransportClass::WiFi);
        assert_eq!(TransportClass::from_capture("Wi-Fi Client"), TransportClass::WiFi);
        assert_eq!(TransportClass::from_capture("BTLE"), TransportClass::BluetoothLe);
        assert_eq!(TransportClass::from_capture("BR/EDR"), TransportClass::BluetoothClassic);
        assert_eq!(TransportClass::from_capture("Bluetooth"), TransportClass::BluetoothClassic);
        assert_eq!(TransportClass::from_capture("RTL433"), TransportClass::Unknown);
    }

    #[test]
    fn transport_display_roundtrip() {
        assert_eq!(TransportClass::WiFi.to_string(), "wifi");
        assert_eq!(TransportClass::BluetoothLe.to_string(), "bluetooth_le");
        let parsed: TransportClass = "bluetooth_classic".parse().unwrap();
        assert_eq!(parsed, TransportClass::BluetoothClassic);
    }
}
