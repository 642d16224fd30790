// WiGLE API response types
//
// Models for `/api/v2/network/search`. Fields use `#[serde(default)]`
// liberally because WiGLE omits keys it has no data for (no city on a
// rural sighting, no trilateration on a single observation, etc.).

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Search response envelope.
///
/// ```json
/// { "success": true, "totalResults": 1, "results": [ ... ] }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub results: Vec<NetworkRecord>,
}

fn default_success() -> bool {
    true
}

// ── Network ──────────────────────────────────────────────────────────

/// One network observation from the WiGLE database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Trilaterated latitude.
    #[serde(default)]
    pub trilat: Option<f64>,
    /// Trilaterated longitude.
    #[serde(default)]
    pub trilong: Option<f64>,
    #[serde(default)]
    pub ssid: Option<String>,
    /// BSSID of the network.
    #[serde(default)]
    pub netid: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Last time WiGLE saw the network, e.g. `2023-04-01T12:00:00.000Z`.
    #[serde(default)]
    pub lastupdt: Option<String>,
    #[serde(default)]
    pub encryption: Option<String>,
    #[serde(default)]
    pub channel: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sparse_record_deserializes() {
        let body = r#"{"results":[{"ssid":"CoffeeShop-Guest"}]}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(resp.success);
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].ssid.as_deref(), Some("CoffeeShop-Guest"));
        assert!(resp.results[0].trilat.is_none());
    }

    #[test]
    fn failure_envelope_keeps_message() {
        let body = r#"{"success":false,"message":"too many queries today"}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("too many queries today"));
        assert!(resp.results.is_empty());
    }
}
