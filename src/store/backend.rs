//! Key-value backends
//!
//! Values are JSON documents. The repository decides what shape lives under
//! each key; backends only move them around.

use crate::error::{EightcountError, Result};
use crate::export::write_json;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage backend for the annotation repository
pub trait KeyValueStore {
    /// Read the document stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a document, replacing any previous value
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Delete a key. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Get the name of this backend (for logging)
    fn name(&self) -> &'static str;
}

/// Volatile backend
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Backend persisted as a single JSON object on disk
///
/// Every write rewrites the whole file: the data is a handful of songs, and
/// each edit must be on disk before the next one is made.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open a store file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let file = File::open(&path).map_err(|e| EightcountError::store_error(&path, e))?;
            match serde_json::from_reader::<_, Value>(BufReader::new(file)) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(EightcountError::store_error(&path, "top level is not a JSON object"));
                }
                Err(e) => return Err(EightcountError::store_error(&path, e)),
            }
        } else {
            debug!("No store file at {}, starting empty", path.display());
            Map::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), entries.len());

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole file atomically
    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| EightcountError::output_error(&self.path, e))?;
            }
        }

        write_json(&self.entries, &self.path)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", json!([1, 2])).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!([1, 2])));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("songs", json!([{"title": "A"}])).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists(), "Temp file should be renamed away");

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("songs").unwrap(), Some(json!([{"title": "A"}])));
    }

    #[test]
    fn test_file_store_file_matches_export_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("k", json!({"bpm": 120.0})).unwrap();

        let exported = dir.path().join("export.json");
        write_json(&json!({"k": {"bpm": 120.0}}), &exported).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            std::fs::read_to_string(&exported).unwrap()
        );
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, EightcountError::StoreError { .. }));
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1,2,3]").unwrap();

        assert!(JsonFileStore::open(&path).is_err());
    }
}
