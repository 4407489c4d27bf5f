use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// In-memory store. Cloning is not supported; share it through `SharedKv`.
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Build a store pre-populated with raw values, e.g. data exported from a browser.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { map: RwLock::new(map) }
    }

    pub fn len(&self) -> usize { self.map.read().len() }
    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.map.write().remove(key);
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// File name of the snapshot inside the store directory.
    pub snapshot_file: String,
    /// Pretty-print the snapshot so it can be inspected and hand-edited.
    pub pretty: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { snapshot_file: "store.json".to_string(), pretty: true }
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_ms: i64,
    entries: BTreeMap<String, String>,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Directory-backed store. All entries live in one snapshot file which is
/// loaded on open and rewritten (temp file + rename) after every mutation.
pub struct FileStore {
    dir: PathBuf,
    settings: StoreSettings,
    map: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(dir, StoreSettings::default())
    }

    pub fn open_with(dir: impl AsRef<Path>, settings: StoreSettings) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let s = Self { dir, settings, map: RwLock::new(BTreeMap::new()) };
        s.load_snapshot()?;
        Ok(s)
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn snapshot_path(&self) -> PathBuf { self.dir.join(&self.settings.snapshot_file) }

    fn load_snapshot(&self) -> Result<(), StoreError> {
        let path = self.snapshot_path();
        if !path.exists() { return Ok(()); }
        let bytes = std::fs::read(&path)?;
        let snap: Snapshot = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(StoreError::Corrupt {
                key: path.display().to_string(),
                reason: format!("unsupported snapshot version {}", snap.version),
            });
        }
        debug!(path = %path.display(), entries = snap.entries.len(), "kv snapshot loaded");
        *self.map.write() = snap.entries;
        Ok(())
    }

    fn save_snapshot(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let saved_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0);
        let snap = Snapshot { version: SNAPSHOT_VERSION, saved_ms, entries: entries.clone() };
        let bytes = if self.settings.pretty { serde_json::to_vec_pretty(&snap)? } else { serde_json::to_vec(&snap)? };
        let path = self.snapshot_path();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Apply `f` to the entries under the write lock and persist the result.
    /// The in-memory map is only updated once the snapshot is on disk.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let mut w = self.map.write();
        let mut next = w.clone();
        f(&mut next);
        self.save_snapshot(&next)?;
        *w = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> { self.map.read().get(key).cloned() }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(|m| { m.insert(key.to_string(), value.to_string()); })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        if !self.map.read().contains_key(key) { return Ok(()); }
        self.mutate(|m| { m.remove(key); })
    }
}
