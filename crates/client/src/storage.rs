//! Persistent key-value bridge.
//!
//! A string-to-string store that survives restarts. State containers that
//! must outlive the process write through it, and the HTTP client reads the
//! organization token from it. Writes are last-writer-wins; there is no
//! locking across processes and no versioning.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Context;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Key holding the organization token attached to outgoing requests.
pub const ORG_TOKEN_KEY: &str = "orgToken";
/// Key holding the selected module label.
pub const SELECTED_MODULE_KEY: &str = "selectedModule";
/// Key holding the persisted firm collection envelope.
pub const FIRM_STORAGE_KEY: &str = "firm-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Browser-style persistent string store.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// In-memory store for tests and contexts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}

// Read-modify-write cycles of every `FileStore` in this process, so two
// handles on one path cannot drop each other's keys.
static FILE_WRITES: Mutex<()> = Mutex::new(());

/// File-backed store: one JSON object of string values.
///
/// Every call re-reads the file so that two handles on the same path (or a
/// restarted process) observe each other's writes. The file is replaced
/// atomically through a sibling temp file. A corrupt file fails reads until
/// the next write, which starts over from an empty map.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at `{app_data_dir}/bizdesk/storage.json`.
    pub fn open_default() -> anyhow::Result<Self> {
        let path = default_storage_path()?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let payload = serde_json::to_string_pretty(map)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(payload.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(std::io::Error::from)?;
        Ok(())
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = FILE_WRITES.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = match self.read_map() {
            Err(StorageError::Corrupt(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "storage file is corrupt, discarding its contents: {err}"
                );
                BTreeMap::new()
            }
            other => other?,
        };
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|map| {
            map.remove(key);
        })
    }
}

/// Open the durable store for this host, or fall back to memory.
///
/// A missing data directory is not an error: the session simply runs without
/// persistence.
pub fn open_default_store() -> Arc<dyn KeyValueStore> {
    match FileStore::open_default() {
        Ok(store) => {
            tracing::info!(path = %store.path().display(), "using file-backed storage");
            Arc::new(store)
        }
        Err(err) => {
            tracing::warn!("persistent storage unavailable, state will not survive restart: {err:?}");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Resolve `{app_data_dir}/bizdesk/storage.json`.
fn default_storage_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("bizdesk");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create storage directory at {:?}", dir))?;

    dir.push("storage.json");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get_item(ORG_TOKEN_KEY).unwrap().is_none());

        store.set_item(ORG_TOKEN_KEY, "tok-1").unwrap();
        store.set_item(ORG_TOKEN_KEY, "tok-2").unwrap();
        assert_eq!(store.get_item(ORG_TOKEN_KEY).unwrap().as_deref(), Some("tok-2"));

        store.remove_item(ORG_TOKEN_KEY).unwrap();
        assert!(store.get_item(ORG_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        {
            let store = FileStore::new(&path);
            store.set_item(SELECTED_MODULE_KEY, "CRM").unwrap();
            store.set_item(ORG_TOKEN_KEY, "abc").unwrap();
            store.remove_item(ORG_TOKEN_KEY).unwrap();
        }

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get_item(SELECTED_MODULE_KEY).unwrap().as_deref(),
            Some("CRM")
        );
        assert!(reopened.get_item(ORG_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get_item(SELECTED_MODULE_KEY),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn write_over_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"selectedModule":"CR"#).unwrap();

        let store = FileStore::new(&path);
        store.set_item(SELECTED_MODULE_KEY, "Invoices").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get_item(SELECTED_MODULE_KEY).unwrap().as_deref(),
            Some("Invoices")
        );
    }

    #[test]
    fn handles_on_one_path_keep_each_others_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let store = FileStore::new(&path);
                std::thread::spawn(move || {
                    for n in 0..10 {
                        store.set_item(&format!("key-{writer}-{n}"), "v").unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        let map: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map.len(), 40);
    }
}
