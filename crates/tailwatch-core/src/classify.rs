// ── Classification engine ──
//
// One pass over a capture batch: skip deny-listed devices, extract each
// profile, record the sighting, and flag devices that are persistent and
// still close by as following candidates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Thresholds;
use crate::extract::extract;
use crate::model::{ClassifiedDevice, DeviceIdentity, HistoryEntry, SurveillanceReport};
use crate::snapshot::CaptureRecord;
use crate::store::{FollowingSet, HistoryStore};

/// Classification state that outlives a single pass.
#[derive(Debug)]
pub struct Classifier {
    thresholds: Thresholds,
    history: HistoryStore,
    following: FollowingSet,
}

impl Classifier {
    pub fn new(thresholds: Thresholds, history_depth: usize) -> Self {
        Self {
            thresholds,
            history: HistoryStore::new(history_depth),
            following: FollowingSet::new(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn following(&self) -> &FollowingSet {
        &self.following
    }

    /// Classify a batch ordered most recently updated first.
    ///
    /// Deny-listed rows are dropped before anything is recorded for them.
    /// Safe to call from several tasks at once: ledger appends are
    /// serialized per identity.
    pub fn classify(
        &self,
        rows: &[CaptureRecord],
        now: DateTime<Utc>,
        deny: &BTreeSet<DeviceIdentity>,
    ) -> SurveillanceReport {
        let mut devices = Vec::with_capacity(rows.len().min(self.thresholds.batch_limit));
        let mut skipped = 0usize;

        for row in rows.iter().take(self.thresholds.batch_limit) {
            if deny.contains(&row.identity) {
                skipped += 1;
                continue;
            }
            devices.push(self.classify_row(row, now));
        }

        let following: Vec<ClassifiedDevice> =
            devices.iter().filter(|d| d.is_following).cloned().collect();
        let total_devices = devices.len();
        devices.truncate(self.thresholds.report_limit);

        let report = SurveillanceReport {
            total_devices,
            devices,
            following,
            following_total: self.following.len(),
            analyzed_at: now,
            error: None,
        };
        info!(
            total = report.total_devices,
            denied = skipped,
            following = report.following.len(),
            following_total = report.following_total,
            "classification pass complete"
        );
        report
    }

    fn classify_row(&self, row: &CaptureRecord, now: DateTime<Utc>) -> ClassifiedDevice {
        let extracted = extract(row);
        if extracted.is_degraded() {
            warn!(
                identity = %row.identity,
                fields = ?extracted.failed_fields,
                "device metadata partially unreadable"
            );
        }
        let profile = extracted.profile;

        let entry = HistoryEntry::from_profile(&profile, now);
        let duration_secs = entry.duration_secs;
        let appearances = self.history.record(&profile.identity, entry);

        let persistence_secs = i64::try_from(self.thresholds.persistence.as_secs()).unwrap_or(i64::MAX);
        let is_persistent =
            appearances >= self.thresholds.min_appearances || duration_secs > persistence_secs;

        let age_minutes = (now - profile.last_seen).num_seconds().div_euclid(60);
        let recency_minutes =
            i64::try_from(self.thresholds.recency.as_secs() / 60).unwrap_or(i64::MAX);
        let is_following = is_persistent && age_minutes < recency_minutes;

        if is_following && self.following.insert(profile.identity.clone()) {
            debug!(identity = %profile.identity, appearances, duration_secs, "new following candidate");
        }

        ClassifiedDevice {
            profile,
            duration_secs,
            appearances,
            is_persistent,
            age_minutes,
            is_following,
            degraded_fields: extracted.failed_fields,
        }
    }
}
