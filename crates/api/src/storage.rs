//! Durable client-side key-value storage.
//!
//! The storefront persists a handful of small JSON payloads (cart id,
//! auth session, UI preferences) outside any provider's own backend.
//! [`KeyValueStore`] is the seam; [`MemoryStore`] backs tests and
//! ephemeral runs, [`FileStore`] persists across restarts.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// A string-keyed store of serialized JSON payloads.
///
/// Implementations are infallible on read: a missing or unreadable key
/// is `None`. Writes may fail silently at the trait level only in the
/// sense that callers treat persistence as best-effort; failures are
/// logged, never propagated into provider results.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Loads and decodes a JSON payload, tolerating absence and corruption.
///
/// A malformed payload is removed and treated as absent so a corrupted
/// file behaves like a first run.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "discarding malformed stored payload");
            store.remove(key);
            None
        }
    }
}

/// Encodes and stores a JSON payload.
pub fn store_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(error) => warn!(key, %error, "failed to serialize payload for storage"),
    }
}

/// In-memory store, dropped with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(key);
        }
    }
}

/// File-backed store, one file per key under a data directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the store, making the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be
    /// created.
    pub fn new(dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are internal constants, but sanitize anyway so a bad key
        // cannot escape the data directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Some(raw),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => {
                warn!(key, %error, "failed to read stored payload");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(error) = std::fs::write(self.path_for(key), value) {
            warn!(key, %error, "failed to persist payload");
        }
    }

    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => warn!(key, %error, "failed to remove stored payload"),
        }
    }
}
