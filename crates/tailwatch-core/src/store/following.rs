// ── Following-candidate set ──

use dashmap::DashSet;

use crate::model::DeviceIdentity;

/// Every identity ever flagged as following. Only grows.
#[derive(Debug, Default)]
pub struct FollowingSet {
    inner: DashSet<DeviceIdentity>,
}

impl FollowingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the identity was not flagged before.
    pub fn insert(&self, identity: DeviceIdentity) -> bool {
        self.inner.insert(identity)
    }

    pub fn contains(&self, identity: &DeviceIdentity) -> bool {
        self.inner.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sorted copy of the flagged identities.
    pub fn snapshot(&self) -> Vec<DeviceIdentity> {
        let mut ids: Vec<_> = self.inner.iter().map(|id| id.key().clone()).collect();
        ids.sort();
        ids
    }
}
