//! Durable per-file analysis state.
//!
//! The store is a plain JSON document keyed by absolute path:
//!
//! ```json
//! { "version": 1, "files": { "/src/a.js": { "path": "/src/a.js", "modifiedAt": 100, "clean": true } } }
//! ```
//!
//! Loading is fail-open. A missing or corrupt document yields an empty store,
//! which only means every file gets analyzed again.

use crate::error::CacheError;
use crate::model::FileRecord;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CACHE_VERSION: u32 = 1;

/// Sibling written before the rename in [`CacheStore::persist`]: `<location>.tmp`.
pub fn temp_path(location: &Path) -> PathBuf {
    let mut name = location
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    location.with_file_name(name)
}

#[derive(Serialize)]
struct CacheDocument<'a> {
    version: u32,
    files: BTreeMap<String, &'a FileRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStore {
    files: HashMap<PathBuf, FileRecord>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `location`, falling back to an empty store on any failure.
    pub fn load(location: &Path) -> Self {
        match Self::try_load(location) {
            Ok(store) => {
                tracing::debug!(
                    "Loaded {} cache entries from {}",
                    store.len(),
                    location.display()
                );
                store
            }
            Err(CacheError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!("No cache at {}. Starting fresh.", location.display());
                Self::new()
            }
            Err(e) => {
                tracing::warn!("{}. Starting with an empty cache.", e);
                Self::new()
            }
        }
    }

    fn try_load(location: &Path) -> Result<Self, CacheError> {
        let bytes = fs::read(location).map_err(|source| CacheError::Read {
            path: location.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Parse {
                path: location.to_path_buf(),
                source,
            })?;

        let mut store = Self::new();
        let Some(files) = document.get("files").and_then(Value::as_object) else {
            tracing::warn!(
                "Cache at {} has no file table. Ignoring it.",
                location.display()
            );
            return Ok(store);
        };

        for (key, value) in files {
            match serde_json::from_value::<FileRecord>(value.clone()) {
                Ok(record) if record.path == Path::new(key) => store.put(record),
                Ok(_) => tracing::debug!("Dropping cache entry {}: path does not match key", key),
                Err(e) => tracing::debug!("Dropping cache entry {}: {}", key, e),
            }
        }

        Ok(store)
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Insert or replace the record for `record.path`.
    pub fn put(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    pub fn merge(&mut self, records: impl IntoIterator<Item = FileRecord>) {
        for record in records {
            self.put(record);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// Write the whole store to `location` via a temp file and a rename.
    pub fn persist(&self, location: &Path) -> Result<(), CacheError> {
        let persist_err = |source| CacheError::Persist {
            path: location.to_path_buf(),
            source,
        };

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }

        // JSON keys must be strings; paths that are not UTF-8 stay in memory only.
        let files = self
            .files
            .iter()
            .filter_map(|(path, record)| match path.to_str() {
                Some(key) => Some((key.to_string(), record)),
                None => {
                    tracing::debug!("Not persisting non UTF-8 path {}", path.display());
                    None
                }
            })
            .collect();
        let document = CacheDocument {
            version: CACHE_VERSION,
            files,
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| persist_err(std::io::Error::other(e)))?;

        let staging = temp_path(location);
        fs::write(&staging, bytes).map_err(persist_err)?;
        fs::rename(&staging, location).map_err(persist_err)?;

        tracing::debug!("Saved {} cache entries to {}", self.len(), location.display());
        Ok(())
    }

    /// Remove the durable record. A missing file is not an error.
    pub fn clear(location: &Path) -> std::io::Result<bool> {
        match fs::remove_file(location) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
