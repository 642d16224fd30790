// ── Allow/deny list persistence ──
//
// Each list is a JSON array of identities on disk, sorted, read and
// written as a whole. Mutations hold the store's mutex across
// load-mutate-save so two concurrent edits cannot drop each other.
// Writes go to a sibling temp file that is then renamed over the target.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::DeviceIdentity;

/// Outcome of a list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListUpdate {
    /// Entries added or removed by this call.
    pub changed: usize,
    /// List size after the call.
    pub total: usize,
}

/// One persisted identity list.
#[derive(Debug)]
pub struct ListStore {
    label: &'static str,
    path: PathBuf,
    lock: Mutex<()>,
}

impl ListStore {
    pub fn new(label: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            label,
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents. A missing, unreadable, or malformed file reads
    /// as an empty list.
    pub fn load(&self) -> BTreeSet<DeviceIdentity> {
        self.read().unwrap_or_else(|e| {
            warn!(list = self.label, path = %self.path.display(), error = %e, "list file unusable");
            BTreeSet::new()
        })
    }

    /// Contents for a mutation. Only absence reads as empty; a file that
    /// exists but cannot be parsed is an error so it is never overwritten.
    fn read(&self) -> Result<BTreeSet<DeviceIdentity>, CoreError> {
        let unreadable = |source| CoreError::ListUnreadable {
            path: self.path.clone(),
            source,
        };
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(list = self.label, path = %self.path.display(), "list file absent");
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(unreadable(e)),
        };
        let ids: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| unreadable(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        Ok(ids.into_iter().map(DeviceIdentity::from).collect())
    }

    /// Replace the persisted list with `set`.
    pub fn save(&self, set: &BTreeSet<DeviceIdentity>) -> Result<(), CoreError> {
        write_atomic(&self.path, set).map_err(|source| CoreError::ListPersistence {
            path: self.path.clone(),
            source,
        })
    }

    pub fn add<I>(&self, ids: I) -> Result<ListUpdate, CoreError>
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        self.mutate(|set| ids.into_iter().filter(|id| set.insert(id.clone())).count())
    }

    pub fn remove(&self, id: &DeviceIdentity) -> Result<ListUpdate, CoreError> {
        self.mutate(|set| usize::from(set.remove(id)))
    }

    pub fn clear(&self) -> Result<ListUpdate, CoreError> {
        self.mutate(|set| {
            let removed = set.len();
            set.clear();
            removed
        })
    }

    fn mutate<F>(&self, op: F) -> Result<ListUpdate, CoreError>
    where
        F: FnOnce(&mut BTreeSet<DeviceIdentity>) -> usize,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut set = self.read()?;
        let changed = op(&mut set);
        if changed > 0 {
            self.save(&set)?;
            info!(list = self.label, changed, total = set.len(), "list updated");
        }
        Ok(ListUpdate {
            changed,
            total: set.len(),
        })
    }
}

fn write_atomic(path: &Path, set: &BTreeSet<DeviceIdentity>) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let ids: Vec<&str> = set.iter().map(DeviceIdentity::as_str).collect();
    let json = serde_json::to_string_pretty(&ids).map_err(io::Error::other)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)
}

/// The deny list (excluded from classification) and the allowlist.
///
/// The allowlist is managed and persisted but not consulted by
/// classification.
#[derive(Debug)]
pub struct ListStores {
    pub deny: ListStore,
    pub allow: ListStore,
}

impl ListStores {
    pub fn new(denylist: impl Into<PathBuf>, allowlist: impl Into<PathBuf>) -> Self {
        Self {
            deny: ListStore::new("denylist", denylist),
            allow: ListStore::new("allowlist", allowlist),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn ids(raw: &[&str]) -> Vec<DeviceIdentity> {
        raw.iter().copied().map(DeviceIdentity::new).collect()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListStore::new("denylist", dir.path().join("deny.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deny.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        assert!(ListStore::new("denylist", &path).load().is_empty());
    }

    #[test]
    fn add_persists_sorted_normalized_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deny.json");
        let store = ListStore::new("denylist", &path);

        let update = store
            .add(ids(&["bb:00:00:00:00:02", "AA:00:00:00:00:01", "BB-00-00-00-00-02"]))
            .unwrap();
        assert_eq!(update, ListUpdate { changed: 2, total: 2 });

        let on_disk = fs::read_to_string(&path).unwrap();
        assert_eq!(
            on_disk,
            "[\n  \"AA:00:00:00:00:01\",\n  \"BB:00:00:00:00:02\"\n]\n"
        );
        assert!(!path.with_file_name("deny.json.tmp").exists());
    }

    #[test]
    fn remove_and_clear_report_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListStore::new("allowlist", dir.path().join("allow.json"));
        store.add(ids(&["AA:00:00:00:00:01", "AA:00:00:00:00:02"])).unwrap();

        let removed = store.remove(&DeviceIdentity::new("aa:00:00:00:00:01")).unwrap();
        assert_eq!(removed, ListUpdate { changed: 1, total: 1 });
        let missing = store.remove(&DeviceIdentity::new("AA:00:00:00:00:09")).unwrap();
        assert_eq!(missing, ListUpdate { changed: 0, total: 1 });

        assert_eq!(store.clear().unwrap(), ListUpdate { changed: 1, total: 0 });
        assert!(store.load().is_empty());
    }

    #[test]
    fn unwritable_target_surfaces_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deny.json");
        fs::create_dir(path.with_file_name("deny.json.tmp")).unwrap();
        let store = ListStore::new("denylist", &path);
        let err = store.add(ids(&["AA:00:00:00:00:01"])).unwrap_err();
        assert!(matches!(err, CoreError::ListPersistence { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deny.json");
        let original = "[\"AA:00:00:00:00:01\",\"AA:00:00:00:00:02\",]";
        fs::write(&path, original).unwrap();
        let store = ListStore::new("denylist", &path);

        let err = store.add(ids(&["AA:00:00:00:00:03"])).unwrap_err();
        assert!(matches!(err, CoreError::ListUnreadable { .. }));
        assert!(matches!(
            store.remove(&DeviceIdentity::new("AA:00:00:00:00:01")),
            Err(CoreError::ListUnreadable { .. })
        ));
        assert!(matches!(store.clear(), Err(CoreError::ListUnreadable { .. })));

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(!path.with_file_name("deny.json.tmp").exists());
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ListStore::new("denylist", dir.path().join("deny.json")));
        let handles: Vec<_> = (0..16u8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .add([DeviceIdentity::new(format!("AA:00:00:00:00:{i:02X}"))])
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.load().len(), 16);
    }
}
