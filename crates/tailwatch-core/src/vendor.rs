// ── Vendor resolver ──
//
// Static OUI → manufacturer table for the handful of vendors that matter
// when the capture tool itself has no manufacturer on record. Kept sorted
// so lookups can binary-search; a unit test enforces the ordering.

use crate::model::DeviceIdentity;

const OUI_TABLE: &[(&str, &str)] = &[
    ("00:03:93", "Apple"),
    ("00:05:02", "Apple"),
    ("00:05:69", "VMware"),
    ("00:0A:27", "Apple"),
    ("00:0A:95", "Apple"),
    ("00:0C:29", "VMware"),
    ("00:0D:93", "Apple"),
    ("00:10:FA", "Apple"),
    ("00:11:24", "Apple"),
    ("00:12:47", "Google"),
    ("00:12:FB", "Samsung"),
    ("00:14:22", "Dell"),
    ("00:14:51", "Apple"),
    ("00:15:5D", "Microsoft"),
    ("00:15:B9", "Samsung"),
    ("00:16:32", "Samsung"),
    ("00:16:CB", "Apple"),
    ("00:17:C9", "Samsung"),
    ("00:17:F2", "Apple"),
    ("00:18:AF", "Samsung"),
    ("00:19:E3", "Apple"),
    ("00:1A:7D", "Broadcom"),
    ("00:1A:8A", "Samsung"),
    ("00:1B:21", "Intel"),
    ("00:1B:63", "Apple"),
    ("00:1B:98", "Samsung"),
    ("00:1C:14", "Dell"),
    ("00:1C:42", "Parallels"),
    ("00:1C:43", "Samsung"),
    ("00:1C:B3", "Apple"),
    ("00:1D:09", "Samsung"),
    ("00:1D:25", "Samsung"),
    ("00:1D:4F", "Apple"),
    ("00:1E:52", "Apple"),
    ("00:1E:67", "Intel"),
    ("00:1E:75", "LG"),
    ("00:1E:7D", "Samsung"),
    ("00:1F:3C", "Netgear"),
    ("00:1F:5B", "Apple"),
    ("00:1F:CD", "Samsung"),
    ("00:1F:F3", "Apple"),
    ("00:21:4C", "Samsung"),
    ("00:21:6A", "Intel"),
    ("00:21:70", "Dell"),
    ("00:21:9B", "Dell"),
    ("00:21:E9", "Apple"),
    ("00:22:41", "Apple"),
    ("00:23:12", "Apple"),
    ("00:23:32", "Apple"),
    ("00:23:39", "Samsung"),
    ("00:23:6C", "Apple"),
    ("00:23:AE", "LG"),
    ("00:23:D6", "Samsung"),
    ("00:23:DF", "Apple"),
    ("00:24:36", "Apple"),
    ("00:24:54", "Samsung"),
    ("00:24:B2", "Netgear"),
    ("00:24:D7", "Intel"),
    ("00:24:E8", "Dell"),
    ("00:25:00", "Apple"),
    ("00:25:38", "Samsung"),
    ("00:25:4B", "Apple"),
    ("00:25:64", "Dell"),
    ("00:25:BC", "Apple"),
    ("00:26:08", "Apple"),
    ("00:26:37", "Samsung"),
    ("00:26:B0", "Apple"),
    ("00:26:B9", "Dell"),
    ("00:26:BB", "TP-Link"),
    ("00:27:0E", "Intel"),
    ("00:27:19", "TP-Link"),
    ("00:50:56", "VMware"),
    ("00:50:F2", "Microsoft"),
    ("00:FC:8B", "Amazon"),
    ("08:00:27", "VirtualBox"),
    ("18:03:73", "Dell"),
    ("18:74:2E", "OnePlus"),
    ("28:CD:C1", "Raspberry Pi"),
    ("34:CE:00", "Xiaomi"),
    ("3C:5A:B4", "Google"),
    ("3C:A9:F4", "Intel"),
    ("48:4B:AA", "Xiaomi"),
    ("48:F1:7F", "Amazon"),
    ("52:54:00", "QEMU/KVM"),
    ("54:60:09", "Google"),
    ("64:09:80", "Xiaomi"),
    ("70:F2:20", "Comcast"),
    ("74:75:48", "Amazon"),
    ("78:02:F8", "Xiaomi"),
    ("7C:7A:91", "Intel"),
    ("A0:63:91", "Netgear"),
    ("AC:37:43", "OnePlus"),
    ("B0:37:95", "LG"),
    ("B8:27:EB", "Raspberry Pi"),
    ("D4:BE:D9", "Dell"),
    ("DC:A6:32", "Raspberry Pi"),
    ("DC:EF:CA", "Google"),
    ("E0:C2:50", "Comcast"),
    ("E4:5F:01", "Raspberry Pi"),
    ("F0:99:BF", "Apple"),
    ("F4:EC:38", "TP-Link"),
    ("F4:F5:D8", "Google"),
    ("FC:E9:98", "Apple"),
];

/// Resolve the manufacturer for an address by its 3-octet prefix.
///
/// Returns `None` for unknown prefixes; callers substitute `"Unknown"`.
pub fn lookup(identity: &DeviceIdentity) -> Option<&'static str> {
    let oui = identity.oui()?;
    OUI_TABLE
        .binary_search_by(|(prefix, _)| (*prefix).cmp(oui))
        .ok()
        .and_then(|idx| OUI_TABLE.get(idx))
        .map(|(_, vendor)| *vendor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in OUI_TABLE.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} !< {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn known_prefix_resolves() {
        assert_eq!(lookup(&DeviceIdentity::new("B8:27:EB:00:11:22")), Some("Raspberry Pi"));
        assert_eq!(lookup(&DeviceIdentity::new("fc-e9-98-aa-bb-cc")), Some("Apple"));
    }

    #[test]
    fn duplicated_prefixes_keep_later_vendor() {
        assert_eq!(lookup(&DeviceIdentity::new("00:1D:09:00:00:00")), Some("Samsung"));
        assert_eq!(lookup(&DeviceIdentity::new("00:26:BB:00:00:00")), Some("TP-Link"));
    }

    #[test]
    fn unknown_prefix_is_none() {
        assert_eq!(lookup(&DeviceIdentity::new("AA:BB:CC:DD:EE:01")), None);
        assert_eq!(lookup(&DeviceIdentity::new("garbage")), None);
    }
}
