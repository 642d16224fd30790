// ── Device profile extraction ──
//
// Turns one raw capture row into a `DeviceProfile`. Kismet's per-device
// JSON is large and loosely typed; every optional field is read
// independently, and a field with an unexpected shape is recorded in
// `failed_fields` instead of failing the whole row.

use serde_json::{Map, Value};

use crate::model::{DeviceProfile, ExtractedProfile, ProfileField, TransportClass};
use crate::snapshot::{CaptureRecord, from_epoch};
use crate::vendor;

const MAX_NETWORKS: usize = 5;
const UNKNOWN_VENDOR: &str = "Unknown";

mod keys {
    pub const MANUF: &str = "kismet.device.base.manuf";
    pub const NAME: &str = "kismet.device.base.name";
    pub const COMMON_NAME: &str = "kismet.device.base.commonname";
    pub const SIGNAL: &str = "kismet.device.base.signal";
    pub const LAST_SIGNAL: &str = "kismet.common.signal.last_signal";
    pub const CHANNEL: &str = "kismet.device.base.channel";
    pub const FREQUENCY: &str = "kismet.device.base.frequency";
    pub const CRYPT: &str = "kismet.device.base.crypt";

    pub const DOT11: &str = "dot11.device";
    pub const PROBED_MAP: &str = "dot11.device.probed_ssid_map";
    pub const PROBED_SSID: &str = "dot11.probedssid.ssid";
    pub const ADVERTISED_MAP: &str = "dot11.device.advertised_ssid_map";
    pub const ADVERTISED_SSID: &str = "dot11.advertisedssid.ssid";

    pub const BLUETOOTH: &str = "bluetooth.device";
    pub const BT_NAME: &str = "bluetooth.device.name";
    pub const BT_CLASS: &str = "bluetooth.device.class";
}

/// Collects fields that could not be parsed, without duplicates.
#[derive(Default)]
struct Failures(Vec<ProfileField>);

impl Failures {
    fn mark(&mut self, field: ProfileField) {
        if !self.0.contains(&field) {
            self.0.push(field);
        }
    }
}

/// Build a profile from a capture row. Never fails.
pub fn extract(record: &CaptureRecord) -> ExtractedProfile {
    let mut failures = Failures::default();
    let mut profile = DeviceProfile {
        identity: record.identity.clone(),
        transport: TransportClass::from_capture(&record.kind),
        kind: record.kind.clone(),
        first_seen: from_epoch(record.first_seen),
        last_seen: from_epoch(record.last_seen),
        traffic_bytes: u64::try_from(record.traffic_bytes).unwrap_or(0),
        manufacturer: String::new(),
        name: None,
        signal_dbm: None,
        channel: None,
        frequency_khz: None,
        encryption: None,
        device_class: None,
        networks: Vec::new(),
    };

    let metadata = record
        .metadata
        .as_deref()
        .and_then(|raw| parse_metadata(raw, &mut failures));

    let reported_manuf = metadata
        .as_ref()
        .and_then(|m| string_field(m, keys::MANUF, ProfileField::Manufacturer, &mut failures))
        .filter(|m| m != UNKNOWN_VENDOR);
    profile.manufacturer = reported_manuf
        .or_else(|| vendor::lookup(&record.identity).map(str::to_owned))
        .unwrap_or_else(|| UNKNOWN_VENDOR.to_owned());

    if let Some(meta) = &metadata {
        fill_from_metadata(&mut profile, meta, &mut failures);
    }

    ExtractedProfile {
        profile,
        failed_fields: failures.0,
    }
}

fn parse_metadata(raw: &str, failures: &mut Failures) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Null) => None,
        _ => {
            failures.mark(ProfileField::Metadata);
            None
        }
    }
}

fn fill_from_metadata(profile: &mut DeviceProfile, meta: &Map<String, Value>, failures: &mut Failures) {
    profile.name = string_field(meta, keys::NAME, ProfileField::Name, failures)
        .or_else(|| string_field(meta, keys::COMMON_NAME, ProfileField::Name, failures));
    profile.signal_dbm = signal(meta, failures);
    profile.channel = text_field(meta, keys::CHANNEL, ProfileField::Channel, failures);
    profile.frequency_khz = frequency(meta, failures);
    profile.encryption = text_field(meta, keys::CRYPT, ProfileField::Encryption, failures);
    profile.networks = networks(meta, failures);

    match meta.get(keys::BLUETOOTH) {
        None | Some(Value::Null) => {}
        Some(Value::Object(bt)) => {
            if let Some(name) = string_field(bt, keys::BT_NAME, ProfileField::Name, failures) {
                profile.name = Some(name);
            }
            profile.device_class =
                text_field(bt, keys::BT_CLASS, ProfileField::DeviceClass, failures);
        }
        Some(_) => failures.mark(ProfileField::DeviceClass),
    }
}

/// Non-empty string value. Any other JSON type marks `field` as failed.
fn string_field(
    map: &Map<String, Value>,
    key: &str,
    field: ProfileField,
    failures: &mut Failures,
) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        _ => {
            failures.mark(field);
            None
        }
    }
}

/// Like [`string_field`], but numbers are accepted and rendered as text.
fn text_field(
    map: &Map<String, Value>,
    key: &str,
    field: ProfileField,
    failures: &mut Failures,
) -> Option<String> {
    match map.get(key) {
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => string_field(map, key, field, failures),
    }
}

fn signal(meta: &Map<String, Value>, failures: &mut Failures) -> Option<i32> {
    let last = match meta.get(keys::SIGNAL)? {
        Value::Object(signal) => signal.get(keys::LAST_SIGNAL)?,
        Value::Null => return None,
        _ => {
            failures.mark(ProfileField::Signal);
            return None;
        }
    };
    match last {
        Value::Null => None,
        Value::Number(n) => {
            let dbm = n.as_i64().and_then(|v| i32::try_from(v).ok());
            if dbm.is_none() {
                failures.mark(ProfileField::Signal);
            }
            dbm
        }
        _ => {
            failures.mark(ProfileField::Signal);
            None
        }
    }
}

#[allow(clippy::float_cmp)]
fn frequency(meta: &Map<String, Value>, failures: &mut Failures) -> Option<f64> {
    match meta.get(keys::FREQUENCY)? {
        Value::Number(n) => n.as_f64().filter(|f| *f != 0.0),
        Value::Null => None,
        _ => {
            failures.mark(ProfileField::Frequency);
            None
        }
    }
}

fn networks(meta: &Map<String, Value>, failures: &mut Failures) -> Vec<String> {
    let dot11 = match meta.get(keys::DOT11) {
        Some(Value::Object(dot11)) => dot11,
        None | Some(Value::Null) => return Vec::new(),
        Some(_) => {
            failures.mark(ProfileField::Networks);
            return Vec::new();
        }
    };

    let probed = ssids(dot11.get(keys::PROBED_MAP), keys::PROBED_SSID, failures);
    if !probed.is_empty() {
        return probed;
    }
    ssids(dot11.get(keys::ADVERTISED_MAP), keys::ADVERTISED_SSID, failures)
}

/// SSIDs from a Kismet SSID map, which is serialized either as an object
/// keyed by hash or as an array of records.
fn ssids(map: Option<&Value>, ssid_key: &str, failures: &mut Failures) -> Vec<String> {
    let entries: Vec<(Option<&str>, &Value)> = match map {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Object(obj)) => obj.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        Some(Value::Array(items)) => items.iter().map(|v| (None, v)).collect(),
        Some(_) => {
            failures.mark(ProfileField::Networks);
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for (key, entry) in entries {
        if found.len() == MAX_NETWORKS {
            break;
        }
        let ssid = match entry {
            Value::Object(record) => match record.get(ssid_key) {
                Some(Value::String(s)) => Some(s.as_str()),
                None | Some(Value::Null) => key,
                Some(_) => {
                    failures.mark(ProfileField::Networks);
                    None
                }
            },
            _ => {
                failures.mark(ProfileField::Networks);
                None
            }
        };
        if let Some(ssid) = ssid.filter(|s| !s.is_empty()) {
            found.push(ssid.to_owned());
        }
    }
    found
}
