//! Persistence port for tasksphere
//!
//! A key/value store of JSON values with change notification. Two adapters:
//! - [`MemoryStore`]: process-local, used by tests and embedders
//! - [`FileStore`]: one `<key>.json` file per key in the data directory
//!
//! # Directory Structure
//!
//! ```text
//! <data-dir>/
//!   tasksphere.toml     # Optional configuration
//!   user.json           # The single registered user
//!   sessionToken.json   # Current session (or null after logout)
//!   tasks.json          # Task collection
//!   projects.json       # Project collection
//!   *.lock              # fs2 lock files guarding writes
//! ```
//!
//! Consistency across processes is last-write-wins: a write from anywhere
//! replaces the value and is broadcast to subscribers, with no merging.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

pub const USER_KEY: &str = "user";
pub const SESSION_KEY: &str = "sessionToken";
pub const TASKS_KEY: &str = "tasks";
pub const PROJECTS_KEY: &str = "projects";

const FILE_EXTENSION: &str = "json";

/// A key changed, from this process or another one.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the new contents could not be read or parsed
    pub value: Option<Value>,
}

/// Key/value persistence with change notification.
pub trait KeyValueStore: Send + Sync {
    /// Read a key. Missing or malformed values read as `None`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Replace a key and notify subscribers.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Receive every subsequent change to any key.
    fn subscribe(&self) -> Receiver<StorageChange>;
}

/// Fan-out of change notifications to any number of subscribers.
#[derive(Debug, Default)]
pub struct ChangeBroadcaster {
    senders: Mutex<Vec<Sender<StorageChange>>>,
}

impl ChangeBroadcaster {
    pub fn subscribe(&self) -> Receiver<StorageChange> {
        let (tx, rx) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Deliver to live subscribers; dropped receivers are forgotten.
    pub fn publish(&self, change: StorageChange) {
        let mut senders = self
            .senders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        senders.retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Parse stored text, treating garbage as absent.
fn parse_stored(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, %err, "malformed stored value; treating as absent");
            None
        }
    }
}

/// Read and deserialize a key, falling back to `default` when it is missing
/// or does not have the expected shape.
pub fn read_or_default<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    let Some(value) = store.get(key) else {
        return default;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(key, %err, "stored value has unexpected shape; using default");
            default
        }
    }
}

/// Serialize and write a key.
pub fn write_value<T: Serialize>(store: &dyn KeyValueStore, key: &str, data: &T) -> Result<()> {
    let value = serde_json::to_value(data)?;
    store.set(key, value)
}

// =========================================================================
// In-memory adapter
// =========================================================================

/// Process-local store holding raw JSON text per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    changes: ChangeBroadcaster,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text without validation, as another writer might.
    ///
    /// Subscribers are notified with the parsed value (or `None`).
    pub fn set_raw(&self, key: &str, raw: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), raw.to_string());
        self.changes.publish(StorageChange {
            key: key.to_string(),
            value: parse_stored(key, raw),
        });
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = self.raw(key)?;
        parse_stored(key, &raw)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), raw);
        self.changes.publish(StorageChange {
            key: key.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

// =========================================================================
// File adapter
// =========================================================================

/// Directory-backed store: `<dir>/<key>.json`, written atomically under a lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    changes: Arc<ChangeBroadcaster>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        // Watchers report canonical paths.
        let dir = fs::canonicalize(&dir)?;
        Ok(Self {
            dir,
            changes: Arc::new(ChangeBroadcaster::default()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }

    /// Map a file in the store directory back to its key.
    pub fn key_for_path(&self, path: &Path) -> Option<String> {
        if path.parent()? != self.dir.as_path() {
            return None;
        }
        if path.extension()?.to_str()? != FILE_EXTENSION {
            return None;
        }
        let key = path.file_stem()?.to_str()?;
        validate_key(key).ok()?;
        Some(key.to_string())
    }

    pub(crate) fn broadcaster(&self) -> Arc<ChangeBroadcaster> {
        Arc::clone(&self.changes)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.key_path(key).ok()?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unreadable store file");
                return None;
            }
        };
        parse_stored(key, &raw)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(key)?;
        let json = serde_json::to_string_pretty(&value)?;
        lock::write_atomic_locked(&path, json.as_bytes(), DEFAULT_LOCK_TIMEOUT_MS)?;
        tracing::debug!(key, "stored value");
        self.changes.publish(StorageChange {
            key: key.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    fn subscribe(&self) -> Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trips_and_notifies() {
        let store = MemoryStore::new();
        let rx = store.subscribe();

        assert!(store.get("tasks").is_none());
        store.set("tasks", json!([1, 2])).expect("set");
        assert_eq!(store.get("tasks"), Some(json!([1, 2])));

        let change = rx.try_recv().expect("change");
        assert_eq!(change.key, "tasks");
        assert_eq!(change.value, Some(json!([1, 2])));
    }

    #[test]
    fn malformed_text_reads_as_absent() {
        let store = MemoryStore::new();
        store.set_raw("user", "{not json");
        assert!(store.get("user").is_none());

        let fallback: Vec<u32> = read_or_default(&store, "user", vec![7]);
        assert_eq!(fallback, vec![7]);
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set("tasks", json!({"not": "a list"})).expect("set");
        let tasks: Vec<String> = read_or_default(&store, "tasks", Vec::new());
        assert!(tasks.is_empty());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = MemoryStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.set("k", json!(1)).expect("set");
        assert_eq!(store.changes.subscriber_count(), 0);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open");
        store.set(TASKS_KEY, json!([{"id": "a"}])).expect("set");

        let reopened = FileStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.get(TASKS_KEY), Some(json!([{"id": "a"}])));
        assert!(dir.path().join("tasks.json").exists());
    }

    #[test]
    fn file_store_treats_corrupt_file_as_absent() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open");
        fs::write(dir.path().join("user.json"), "{\"id\":").expect("write");
        assert!(store.get(USER_KEY).is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open");
        let err = store.set("../escape", json!(1)).expect_err("invalid key");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(store.get("../escape").is_none());
    }

    #[test]
    fn key_for_path_only_maps_store_files() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::open(dir.path()).expect("open");
        assert_eq!(
            store.key_for_path(&store.dir().join("sessionToken.json")),
            Some(SESSION_KEY.to_string())
        );
        assert_eq!(store.key_for_path(&store.dir().join("tasks.lock")), None);
        assert_eq!(store.key_for_path(Path::new("/elsewhere/tasks.json")), None);
    }
}
