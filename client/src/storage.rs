//! Key-value persistence standing in for browser local storage.
//!
//! The runtime only ever needs string get/set by key, so that is all the
//! trait offers. [`MemoryStore`] backs tests; [`FileStore`] keeps a JSON
//! object on disk for the terminal client.

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::marks::MarkSet;

pub const TICKET_KEY: &str = "ticketId";

pub fn marks_key(ticket_id: &str) -> String {
    format!("marked_{}", ticket_id)
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn load_ticket_id(store: &dyn KeyValueStore) -> Option<String> {
    store.get(TICKET_KEY).filter(|id| !id.is_empty())
}

pub fn save_ticket_id(store: &dyn KeyValueStore, ticket_id: &str) -> Result<(), StorageError> {
    store.set(TICKET_KEY, ticket_id)
}

/// Saved marks for a ticket; unreadable data counts as no marks.
pub fn load_marks(store: &dyn KeyValueStore, ticket_id: &str) -> MarkSet {
    match store.get(&marks_key(ticket_id)) {
        Some(raw) => MarkSet::from_json(&raw).unwrap_or_else(|e| {
            warn!("discarding unreadable marks for {}: {}", ticket_id, e);
            MarkSet::new()
        }),
        None => MarkSet::new(),
    }
}

pub fn save_marks(store: &dyn KeyValueStore, ticket_id: &str, marks: &MarkSet) -> Result<(), StorageError> {
    store.set(&marks_key(ticket_id), &marks.to_json())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten in full on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens or creates the store. A file that does not parse is moved to
    /// `<name>.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    let aside = corrupt_path(&path);
                    warn!("store {} is unreadable ({}), moving it to {}", path.display(), e, aside.display());
                    fs::rename(&path, &aside)?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            inner: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.inner.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.inner.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
