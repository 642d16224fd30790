// ── Network geolocation ──
//
// Resolves broadcast network names to approximate locations through an
// external service, with a process-lifetime cache in front. Lookups are
// never part of a classification pass. A failed or timed-out lookup is
// reported as "not found" and is not cached, so the next request for the
// same name tries again.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tokio::time::Instant;
use tracing::{debug, warn};

use tailwatch_api::{AreaQuery, Credentials, TransportConfig, WigleClient};

use crate::error::CoreError;
use crate::model::{GeoLocation, NearbyNetwork};

/// Half-width in degrees of the box searched around a point (~1 km).
pub const NEARBY_RADIUS_DEG: f64 = 0.01;
/// Maximum networks returned by an area search.
pub const NEARBY_LIMIT: u32 = 50;

/// Seam between the cache and whatever answers location queries.
pub trait GeoResolver: Send + Sync {
    /// Best location for an exact network name, or `None` if unknown.
    fn resolve<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<GeoLocation>, CoreError>>;

    /// Networks observed inside a bounding box.
    fn nearby<'a>(
        &'a self,
        area: &'a AreaQuery,
    ) -> BoxFuture<'a, Result<Vec<NearbyNetwork>, CoreError>>;
}

// ── WiGLE ────────────────────────────────────────────────────────────

/// [`GeoResolver`] backed by the WiGLE search API.
///
/// Name lookups and area searches use separate clients so each carries
/// its own request timeout.
pub struct WigleResolver {
    lookup: WigleClient,
    area: WigleClient,
}

impl WigleResolver {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        lookup_timeout: Duration,
        nearby_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let lookup = WigleClient::new(
            base_url,
            credentials.clone(),
            &TransportConfig::default().with_timeout(lookup_timeout),
        )?;
        let area = WigleClient::new(
            base_url,
            credentials,
            &TransportConfig::default().with_timeout(nearby_timeout),
        )?;
        Ok(Self { lookup, area })
    }
}

impl GeoResolver for WigleResolver {
    fn resolve<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<GeoLocation>, CoreError>> {
        Box::pin(async move {
            let record = self.lookup.search_ssid(name).await?;
            Ok(record.as_ref().and_then(GeoLocation::from_record))
        })
    }

    fn nearby<'a>(
        &'a self,
        area: &'a AreaQuery,
    ) -> BoxFuture<'a, Result<Vec<NearbyNetwork>, CoreError>> {
        Box::pin(async move {
            let records = self.area.search_area(area).await?;
            Ok(records.into_iter().map(NearbyNetwork::from).collect())
        })
    }
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CachedLocation {
    location: GeoLocation,
    stored_at: Instant,
}

/// Name-keyed cache of successful lookups.
///
/// Keys are matched exactly; `"Cafe"` and `"cafe "` are different
/// entries. No lock is held while the resolver is awaited, so two
/// concurrent misses for one name may both reach the resolver.
pub struct GeoCache {
    resolver: Arc<dyn GeoResolver>,
    entries: DashMap<String, CachedLocation>,
    timeout: Duration,
    ttl: Option<Duration>,
}

impl GeoCache {
    pub fn new(resolver: Arc<dyn GeoResolver>, timeout: Duration, ttl: Option<Duration>) -> Self {
        Self {
            resolver,
            entries: DashMap::new(),
            timeout,
            ttl,
        }
    }

    pub fn resolver(&self) -> &Arc<dyn GeoResolver> {
        &self.resolver
    }

    /// Cached or freshly resolved location for `name`.
    pub async fn resolve(&self, name: &str) -> Option<GeoLocation> {
        if let Some(hit) = self.cached(name) {
            debug!(name, "geo cache hit");
            return Some(hit);
        }

        match tokio::time::timeout(self.timeout, self.resolver.resolve(name)).await {
            Ok(Ok(Some(location))) => {
                self.entries.insert(
                    name.to_owned(),
                    CachedLocation {
                        location: location.clone(),
                        stored_at: Instant::now(),
                    },
                );
                debug!(name, "geo lookup cached");
                Some(location)
            }
            Ok(Ok(None)) => {
                debug!(name, "geo lookup found nothing");
                None
            }
            Ok(Err(e)) => {
                warn!(name, error = %e, "geo lookup failed");
                None
            }
            Err(_) => {
                warn!(name, timeout_secs = self.timeout.as_secs(), "geo lookup timed out");
                None
            }
        }
    }

    /// Area search under `timeout`. Results are not cached.
    pub async fn nearby(
        &self,
        area: &AreaQuery,
        timeout: Duration,
    ) -> Result<Vec<NearbyNetwork>, CoreError> {
        tokio::time::timeout(timeout, self.resolver.nearby(area))
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            })?
    }

    /// Unexpired cache entry, without contacting the resolver.
    pub fn cached(&self, name: &str) -> Option<GeoLocation> {
        let entry = self.entries.get(name)?;
        if self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl) {
            return None;
        }
        Some(entry.location.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
