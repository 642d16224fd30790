// ── Classification service ──
//
// Owns all engine state: snapshot source, allow/deny lists, sighting
// history, following set, and the optional geo cache. Consumers hold a
// cheap clone and call into it from any task.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tailwatch_api::AreaQuery;

use crate::classify::Classifier;
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::geo::{GeoCache, GeoResolver, NEARBY_LIMIT, NEARBY_RADIUS_DEG};
use crate::model::{
    DeviceIdentity, GeoLocation, HistoryEntry, NearbyNetwork, SurveillanceReport, TrackPoint,
};
use crate::snapshot::SnapshotSource;
use crate::store::{ListStore, ListStores, ListUpdate};

const STOPPED: &str = "service stopped";

/// Result of deny-listing every device in the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoDenyOutcome {
    /// Identities present in the snapshot.
    pub seen: usize,
    /// Deny list size afterwards.
    pub total: usize,
    /// Identities that were not denied before.
    pub added: usize,
}

/// The engine's entry point.
///
/// Cheaply cloneable via `Arc<ServiceInner>`. Every clone shares the same
/// history, following set, lists, and geo cache.
#[derive(Clone)]
pub struct ClassificationService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: ServiceConfig,
    source: Arc<dyn SnapshotSource>,
    lists: ListStores,
    classifier: Classifier,
    geo: OnceLock<GeoCache>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ClassificationService {
    pub fn new(config: ServiceConfig, source: Arc<dyn SnapshotSource>) -> Self {
        let lists = ListStores::new(&config.denylist_path, &config.allowlist_path);
        let classifier = Classifier::new(config.thresholds, config.history_depth);
        Self {
            inner: Arc::new(ServiceInner {
                config,
                source,
                lists,
                classifier,
                geo: OnceLock::new(),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Enable network geolocation through `resolver`.
    ///
    /// Only the first resolver is kept; later calls are ignored.
    pub fn with_geo(self, resolver: Arc<dyn GeoResolver>) -> Self {
        let cache = GeoCache::new(
            resolver,
            self.inner.config.geo_timeout,
            self.inner.config.geo_cache_ttl,
        );
        if self.inner.geo.set(cache).is_err() {
            warn!("geo resolver already configured, ignoring replacement");
        }
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn source(&self) -> &Arc<dyn SnapshotSource> {
        &self.inner.source
    }

    pub fn has_geo(&self) -> bool {
        self.inner.geo.get().is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn ensure_running(&self) -> Result<(), CoreError> {
        if self.is_stopped() {
            Err(CoreError::ServiceStopped)
        } else {
            Ok(())
        }
    }

    // ── Classification ───────────────────────────────────────────────

    /// Run one classification pass against the latest snapshot.
    ///
    /// Never fails: an unreadable snapshot yields a zero-valued report
    /// carrying the error text.
    pub async fn analyze(&self) -> SurveillanceReport {
        self.analyze_at(Utc::now()).await
    }

    /// [`analyze`](Self::analyze) with an explicit pass time.
    pub async fn analyze_at(&self, now: DateTime<Utc>) -> SurveillanceReport {
        if self.is_stopped() {
            return SurveillanceReport::failed(STOPPED, now);
        }

        let limit = self.inner.config.thresholds.batch_limit;
        let rows = match self.blocking(move |source| source.latest(limit)).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, source = %self.inner.source.describe(), "snapshot unavailable");
                return SurveillanceReport::failed(e.to_string(), now);
            }
        };
        debug!(rows = rows.len(), "snapshot batch loaded");

        let deny = self.inner.lists.deny.load();
        self.inner.classifier.classify(&rows, now, &deny)
    }

    /// Positional aggregates for one device.
    pub async fn track(&self, identity: &DeviceIdentity) -> Result<Vec<TrackPoint>, CoreError> {
        self.ensure_running()?;
        let identity = identity.clone();
        self.blocking(move |source| source.track(&identity)).await
    }

    /// Ledger entries retained for a device, oldest first.
    pub fn history(&self, identity: &DeviceIdentity) -> Vec<HistoryEntry> {
        self.inner.classifier.history().entries(identity)
    }

    /// Passes that have recorded a device.
    pub fn appearances(&self, identity: &DeviceIdentity) -> u64 {
        self.inner.classifier.history().appearances(identity)
    }

    /// Distinct devices ever flagged as following.
    pub fn following_total(&self) -> usize {
        self.inner.classifier.following().len()
    }

    pub fn following(&self) -> Vec<DeviceIdentity> {
        self.inner.classifier.following().snapshot()
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SnapshotSource) -> Result<T, CoreError> + Send + 'static,
    {
        let source = Arc::clone(&self.inner.source);
        tokio::task::spawn_blocking(move || op(source.as_ref())).await?
    }

    // ── Geolocation ──────────────────────────────────────────────────

    fn geo(&self) -> Result<&GeoCache, CoreError> {
        self.ensure_running()?;
        self.inner.geo.get().ok_or(CoreError::GeoUnavailable)
    }

    /// Approximate location of a network name. `Ok(None)` covers both
    /// "unknown" and a failed or timed-out lookup.
    pub async fn resolve_network(&self, name: &str) -> Result<Option<GeoLocation>, CoreError> {
        Ok(self.geo()?.resolve(name).await)
    }

    /// Networks within roughly a kilometre of a point.
    pub async fn nearby(&self, lat: f64, lon: f64) -> Result<Vec<NearbyNetwork>, CoreError> {
        let geo = self.geo()?;
        let area = AreaQuery::around(lat, lon, NEARBY_RADIUS_DEG, NEARBY_LIMIT);
        geo.nearby(&area, self.inner.config.nearby_timeout).await
    }

    // ── Lists ────────────────────────────────────────────────────────

    fn list(&self, pick: fn(&ListStores) -> &ListStore) -> Result<&ListStore, CoreError> {
        self.ensure_running()?;
        Ok(pick(&self.inner.lists))
    }

    pub fn deny_list(&self) -> Result<BTreeSet<DeviceIdentity>, CoreError> {
        Ok(self.list(|l| &l.deny)?.load())
    }

    pub fn allow_list(&self) -> Result<BTreeSet<DeviceIdentity>, CoreError> {
        Ok(self.list(|l| &l.allow)?.load())
    }

    pub fn deny<I>(&self, ids: I) -> Result<ListUpdate, CoreError>
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        self.list(|l| &l.deny)?.add(ids)
    }

    pub fn undeny(&self, id: &DeviceIdentity) -> Result<ListUpdate, CoreError> {
        self.list(|l| &l.deny)?.remove(id)
    }

    pub fn clear_denied(&self) -> Result<ListUpdate, CoreError> {
        self.list(|l| &l.deny)?.clear()
    }

    pub fn allow<I>(&self, ids: I) -> Result<ListUpdate, CoreError>
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        self.list(|l| &l.allow)?.add(ids)
    }

    pub fn unallow(&self, id: &DeviceIdentity) -> Result<ListUpdate, CoreError> {
        self.list(|l| &l.allow)?.remove(id)
    }

    pub fn clear_allowed(&self) -> Result<ListUpdate, CoreError> {
        self.list(|l| &l.allow)?.clear()
    }

    /// Deny-list every device in the current snapshot, whatever its type.
    pub async fn deny_all_current(&self) -> Result<AutoDenyOutcome, CoreError> {
        self.ensure_running()?;
        let ids = self.blocking(|source| source.identities()).await?;
        let seen = ids.len();
        let update = self.deny(ids)?;
        info!(seen, added = update.changed, total = update.total, "snapshot deny-listed");
        Ok(AutoDenyOutcome {
            seen,
            total: update.total,
            added: update.changed,
        })
    }

    // ── Background analysis ──────────────────────────────────────────

    /// Run a pass now, then keep running one every `period` until
    /// [`shutdown`](Self::shutdown). Each report is published on the
    /// returned channel. A zero `period` is rejected.
    pub async fn spawn_watch(
        &self,
        period: Duration,
    ) -> Result<watch::Receiver<Arc<SurveillanceReport>>, CoreError> {
        if period.is_zero() {
            return Err(CoreError::Config {
                message: "watch period must be greater than zero".into(),
            });
        }
        let first = self.analyze().await;
        let (tx, rx) = watch::channel(Arc::new(first));
        if self.is_stopped() {
            return Ok(rx);
        }

        let handle = tokio::spawn(watch_task(self.clone(), period, tx, self.inner.cancel.clone()));
        self.inner.task_handles.lock().await.push(handle);
        info!(period_secs = period.as_secs(), "periodic analysis started");
        Ok(rx)
    }

    /// Stop background tasks. Afterwards every operation reports that the
    /// service is stopped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("classification service stopped");
    }
}

/// Periodically analyze and publish the report.
async fn watch_task(
    service: ClassificationService,
    period: Duration,
    tx: watch::Sender<Arc<SurveillanceReport>>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tx.closed() => {
                debug!("no report subscribers left");
                break;
            }
            _ = interval.tick() => {
                let report = service.analyze().await;
                if report.is_failed() {
                    warn!(error = report.error.as_deref().unwrap_or_default(), "periodic analysis failed");
                }
                let _ = tx.send(Arc::new(report));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::snapshot::{CaptureRecord, MemorySource};

    fn row(mac: &str, first: i64, last: i64) -> CaptureRecord {
        CaptureRecord {
            identity: DeviceIdentity::new(mac),
            kind: "Wi-Fi Client".into(),
            first_seen: first,
            last_seen: last,
            traffic_bytes: 0,
            metadata: None,
        }
    }

    fn service(source: MemorySource) -> (tempfile::TempDir, ClassificationService) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::with_data_dir(dir.path());
        (dir, ClassificationService::new(config, Arc::new(source)))
    }

    #[tokio::test]
    async fn missing_snapshot_yields_failed_report() {
        let (_dir, svc) = service(MemorySource::new());
        let report = svc.analyze().await;
        assert!(report.is_failed());
        assert_eq!(report.total_devices, 0);
        assert!(report.error.unwrap().contains("No capture snapshot"));
    }

    #[tokio::test]
    async fn geo_without_resolver_is_unavailable() {
        let (_dir, svc) = service(MemorySource::with_rows(Vec::new()));
        let err = svc.resolve_network("HomeNet").await.unwrap_err();
        assert!(matches!(err, CoreError::GeoUnavailable));
        assert!(!svc.has_geo());
    }

    #[tokio::test]
    async fn clones_share_history() {
        let source = MemorySource::with_rows(vec![row("AA:BB:CC:DD:EE:01", 100, 110)]);
        let (_dir, svc) = service(source);
        let other = svc.clone();
        let now = DateTime::from_timestamp(120, 0).unwrap();

        svc.analyze_at(now).await;
        other.analyze_at(now).await;
        let third = svc.analyze_at(now).await;

        assert_eq!(third.devices[0].appearances, 3);
        assert_eq!(other.appearances(&DeviceIdentity::new("AA:BB:CC:DD:EE:01")), 3);
        assert_eq!(svc.following_total(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_every_operation() {
        let (_dir, svc) = service(MemorySource::with_rows(Vec::new()));
        svc.shutdown().await;

        let report = svc.analyze().await;
        assert_eq!(report.error.as_deref(), Some(STOPPED));
        assert!(matches!(svc.deny_list(), Err(CoreError::ServiceStopped)));
        assert!(matches!(
            svc.track(&DeviceIdentity::new("AA:BB:CC:DD:EE:01")).await,
            Err(CoreError::ServiceStopped)
        ));
        assert!(matches!(svc.deny_all_current().await, Err(CoreError::ServiceStopped)));
    }

    #[tokio::test]
    async fn zero_watch_period_is_rejected() {
        let (_dir, svc) = service(MemorySource::with_rows(Vec::new()));
        let err = svc.spawn_watch(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
        assert!(svc.inner.task_handles.lock().await.is_empty());
    }

    #[tokio::test]
    async fn deny_all_current_counts_new_entries() {
        let source = MemorySource::with_rows(vec![
            row("AA:BB:CC:DD:EE:01", 1, 2),
            row("AA:BB:CC:DD:EE:02", 1, 2),
        ]);
        let (_dir, svc) = service(source);
        svc.deny([DeviceIdentity::new("AA:BB:CC:DD:EE:01")]).unwrap();

        let outcome = svc.deny_all_current().await.unwrap();
        assert_eq!(outcome, AutoDenyOutcome { seen: 2, total: 2, added: 1 });
        assert!(svc.allow_list().unwrap().is_empty());
    }
}
