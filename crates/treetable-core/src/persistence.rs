#![forbid(unsafe_code)]

//! Best-effort persistence of visibility state.
//!
//! Saved state survives reloads but is never required for correctness: any
//! failure to write is logged and ignored, and any failure to read (missing
//! key, malformed JSON, version or row-count mismatch, a state that breaks
//! the ancestor invariant) means "no saved state".
//!
//! # Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "rows": [
//!     { "visible": true, "open": true },
//!     { "visible": true, "open": false }
//!   ]
//! }
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, StoreError};
use crate::row_index::RowIndex;
use crate::visibility::{PersistedState, VisibilityStore};

/// Current persisted format version.
pub const FORMAT_VERSION: u64 = 1;

/// String key-value storage, e.g. browser local storage or a directory.
pub trait KeyValueStore {
    /// Read the value under `key`. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: AHashMap<String, String>,
    quota: Option<usize>,
    available: bool,
}

/// In-memory store. Clones are handles onto the same entries, so several
/// table instances can share one store the way pages share local storage.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryInner {
                available: true,
                ..MemoryInner::default()
            })),
        }
    }

    /// Limit the total stored bytes (keys plus values).
    #[must_use]
    pub fn with_quota(self, bytes: usize) -> Self {
        self.inner.borrow_mut().quota = Some(bytes);
        self
    }

    /// Make every read and write fail, as when storage is disabled.
    pub fn set_available(&self, available: bool) {
        self.inner.borrow_mut().available = available;
    }

    /// Raw value under `key`, bypassing availability.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Overwrite the raw value under `key`, bypassing quota and availability.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.borrow();
        if !inner.available {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.available {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        if let Some(limit) = inner.quota {
            let others: usize = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }
        inner.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temp file that is then renamed over the target, so a crash
/// never leaves a half-written state file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files under `dir`, which must already exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, value)?;
        fs::rename(&temp, &path)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u64,
    rows: PersistedState,
}

/// Serialize state into the persisted format.
pub fn encode(state: &PersistedState) -> Result<String, PersistError> {
    let file = StateFile {
        version: FORMAT_VERSION,
        rows: state.clone(),
    };
    Ok(serde_json::to_string(&file)?)
}

/// Parse the persisted format.
pub fn decode(raw: &str) -> Result<PersistedState, PersistError> {
    let file: StateFile = serde_json::from_str(raw)?;
    if file.version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: file.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(file.rows)
}

/// Saves and loads one table's visibility under a fixed key.
pub struct StatePersistence {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for StatePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl StatePersistence {
    #[must_use]
    pub fn new(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write `state`, reporting failures.
    pub fn try_save(&mut self, state: &VisibilityStore) -> Result<(), PersistError> {
        let raw = encode(&state.snapshot())?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }

    /// Write `state`; failures are logged and swallowed. Returns whether the
    /// write succeeded.
    pub fn save(&mut self, state: &VisibilityStore) -> bool {
        match self.try_save(state) {
            Ok(()) => {
                tracing::debug!(
                    target: "treetable.persist",
                    key = %self.key,
                    rows = state.len(),
                    "state saved"
                );
                true
            }
            Err(error) => {
                tracing::warn!(
                    target: "treetable.persist",
                    key = %self.key,
                    error = %error,
                    "failed to save state; continuing unpersisted"
                );
                false
            }
        }
    }

    /// Read and validate saved state for `index`, reporting failures.
    /// `Ok(None)` when nothing was saved.
    pub fn try_load(&self, index: &RowIndex) -> Result<Option<VisibilityStore>, PersistError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let state = decode(&raw)?;
        let mut store = VisibilityStore::hidden(index.len());
        store.restore(&state)?;
        store.check_invariant(index)?;
        Ok(Some(store))
    }

    /// Read saved state; any failure is logged and treated as "no saved state".
    #[must_use]
    pub fn load(&self, index: &RowIndex) -> Option<VisibilityStore> {
        match self.try_load(index) {
            Ok(Some(store)) => {
                tracing::debug!(
                    target: "treetable.persist",
                    key = %self.key,
                    rows = store.len(),
                    "state loaded"
                );
                Some(store)
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(
                    target: "treetable.persist",
                    key = %self.key,
                    error = %error,
                    "ignoring saved state"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> RowIndex {
        RowIndex::from_markers([0, 1, 2, 0].map(Some))
    }

    #[test]
    fn encode_decode_round_trip() {
        let idx = index();
        let state = VisibilityStore::initial(&idx, true).snapshot();
        let raw = encode(&state).unwrap();
        assert!(raw.starts_with(r#"{"version":1,"rows":["#));
        assert_eq!(decode(&raw).unwrap(), state);
    }

    #[test]
    fn decode_rejects_other_versions() {
        let err = decode(r#"{"version":2,"rows":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            PersistError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn save_then_load_reproduces_state() {
        let idx = index();
        let kv = MemoryStore::new();
        let mut writer = StatePersistence::new(kv.clone(), "k");
        let state = VisibilityStore::initial(&idx, true);
        assert!(writer.save(&state));

        let reader = StatePersistence::new(kv, "k");
        assert_eq!(reader.load(&idx), Some(state));
    }

    #[test]
    fn missing_key_is_none() {
        let p = StatePersistence::new(MemoryStore::new(), "absent");
        assert!(p.try_load(&index()).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_ignored() {
        let kv = MemoryStore::new();
        kv.insert_raw("k", "{not json");
        let p = StatePersistence::new(kv, "k");
        assert!(matches!(p.try_load(&index()), Err(PersistError::Json(_))));
        assert!(p.load(&index()).is_none());
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let kv = MemoryStore::new();
        let short = PersistedState::new(vec![Default::default(); 2]);
        kv.insert_raw("k", &encode(&short).unwrap());
        let p = StatePersistence::new(kv, "k");
        assert!(matches!(p.try_load(&index()), Err(PersistError::Restore(_))));
    }

    #[test]
    fn invariant_breaking_state_is_rejected() {
        let idx = index();
        let mut bad = VisibilityStore::hidden(4);
        bad.set(2, true, false);
        let kv = MemoryStore::new();
        kv.insert_raw("k", &encode(&bad.snapshot()).unwrap());
        let p = StatePersistence::new(kv, "k");
        assert!(matches!(p.try_load(&idx), Err(PersistError::Invariant(_))));
    }

    #[test]
    fn unavailable_store_fails_softly() {
        let kv = MemoryStore::new();
        kv.set_available(false);
        let mut p = StatePersistence::new(kv.clone(), "k");
        let idx = index();
        assert!(!p.save(&VisibilityStore::initial(&idx, false)));
        assert!(p.load(&idx).is_none());
        assert!(kv.is_empty());
    }

    #[test]
    fn quota_exceeded_fails_softly() {
        let kv = MemoryStore::new().with_quota(16);
        let mut p = StatePersistence::new(kv.clone(), "k");
        let idx = index();
        let err = p.try_save(&VisibilityStore::initial(&idx, false)).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Store(StoreError::QuotaExceeded { limit: 16, .. })
        ));
        assert!(!p.save(&VisibilityStore::initial(&idx, false)));
        assert!(kv.raw("k").is_none());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs_store = FileStore::new(dir.path());
        assert_eq!(fs_store.get("treetable-state:a b").unwrap(), None);
        fs_store.set("treetable-state:a b", "{}").unwrap();
        assert_eq!(
            fs_store.get("treetable-state:a b").unwrap().as_deref(),
            Some("{}")
        );
        assert!(fs_store.path_for("treetable-state:a b").ends_with("treetable-state_a_b.json"));
        assert!(!fs_store.path_for("x").with_extension("json.tmp").exists());
    }
}
