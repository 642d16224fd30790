// ── Device identity ──
//
// Every sighting, ledger entry, and list membership is keyed by the
// hardware address of the observed radio. The capture tool reports
// addresses in uppercase; operators paste them in whatever case their
// terminal gave them. Normalizing once here keeps every map honest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hardware address of an observed radio interface.
///
/// Opaque and case-insensitive: normalized to uppercase colon-separated
/// format (`AA:BB:CC:DD:EE:FF`). Dashes are accepted as separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_uppercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first three octets (`AA:BB:CC`), or `None` for addresses too
    /// short to carry a vendor prefix.
    pub fn oui(&self) -> Option<&str> {
        let mut octets = self.0.match_indices(':');
        let (third_sep, _) = octets.nth(2)?;
        Some(&self.0[..third_sep])
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceIdentity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for DeviceIdentity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for DeviceIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<DeviceIdentity> for String {
    fn from(id: DeviceIdentity) -> Self {
        id.0
    }
}
