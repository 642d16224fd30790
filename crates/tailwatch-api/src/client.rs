// WiGLE search API HTTP client
//
// Wraps `reqwest::Client` with Basic auth, the search endpoint URL, and
// response envelope handling. Only the two queries the engine needs are
// modelled: exact SSID search and bounding-box search.

use reqwest::StatusCode;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{NetworkRecord, SearchResponse};
use crate::transport::TransportConfig;

const SEARCH_PATH: &str = "api/v2/network/search";

/// Fallback `Retry-After` when a 429 carries no usable header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Bounding box for an area search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaQuery {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub per_page: u32,
}

impl AreaQuery {
    /// A square box of `radius_deg` around a point.
    pub fn around(lat: f64, lon: f64, radius_deg: f64, per_page: u32) -> Self {
        Self {
            lat_min: lat - radius_deg,
            lat_max: lat + radius_deg,
            lon_min: lon - radius_deg,
            lon_max: lon + radius_deg,
            per_page,
        }
    }

    fn params(&self) -> [(&'static str, String); 5] {
        [
            ("latrange1", self.lat_min.to_string()),
            ("latrange2", self.lat_max.to_string()),
            ("longrange1", self.lon_min.to_string()),
            ("longrange2", self.lon_max.to_string()),
            ("resultsPerPage", self.per_page.to_string()),
        ]
    }
}

/// Async client for the WiGLE network search API.
///
/// Every request carries HTTP Basic credentials. The `timeout` of the
/// transport config bounds each request; an elapsed timeout surfaces as
/// [`Error::Timeout`] rather than a generic transport error.
pub struct WigleClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
}

impl WigleClient {
    /// Build a client from a base URL (e.g. `https://api.wigle.net`).
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            credentials,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages timeouts).
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            credentials,
            timeout_secs: 0,
        })
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Search for a network by exact SSID, returning the best match.
    ///
    /// `Ok(None)` means the service answered but has no record of the name.
    pub async fn search_ssid(&self, ssid: &str) -> Result<Option<NetworkRecord>, Error> {
        let resp = self.search(&[("ssid", ssid.to_owned())]).await?;
        Ok(resp.results.into_iter().next())
    }

    /// Search for networks inside a bounding box.
    pub async fn search_area(&self, area: &AreaQuery) -> Result<Vec<NetworkRecord>, Error> {
        let mut resp = self.search(&area.params()).await?;
        let cap = usize::try_from(area.per_page).unwrap_or(usize::MAX);
        resp.results.truncate(cap);
        Ok(resp.results)
    }

    // ── Transport ────────────────────────────────────────────────────

    async fn search(&self, params: &[(&str, String)]) -> Result<SearchResponse, Error> {
        let url = self.base_url.join(SEARCH_PATH)?;
        debug!("GET {url} params={params:?}");

        let builder = self.credentials.apply(self.http.get(url).query(params));
        let resp = builder.send().await.map_err(|e| self.map_transport(e))?;

        self.parse_response(resp).await
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn parse_response(&self, resp: reqwest::Response) -> Result<SearchResponse, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!(
                    "credentials for '{}' rejected (HTTP {status})",
                    self.credentials.name()
                ),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: preview(&body).to_owned(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        trace!(bytes = body.len(), "search response received");

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if !parsed.success {
            return Err(Error::Api {
                message: parsed
                    .message
                    .unwrap_or_else(|| "search reported success=false".into()),
                status: status.as_u16(),
            });
        }

        Ok(parsed)
    }
}

/// Ensure the base URL ends with `/` so relative joins keep its path.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
