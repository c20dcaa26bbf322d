//! JSONL-based storage implementation with in-memory caching.
//!
//! One `<collection>.jsonl` file per collection. Several processes may share
//! the directory: every mutation takes an exclusive lock on
//! `<collection>.lock`, reloads the collection from disk and only then checks
//! its conditions and writes. Reads reload the cache when the file's size or
//! modification time no longer match what was loaded.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use serde::{Serialize, de::DeserializeOwned};

use super::traits::{Filter, HasId, Storage};
use crate::error::{CallwaveError, Result};

/// Size and modification time of a collection file when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

#[derive(Debug, Default)]
struct Loaded {
    /// `None` when the file did not exist
    stamp: Option<FileStamp>,
    records: Vec<serde_json::Value>,
}

type Cache = HashMap<String, Loaded>;

/// JSONL-based storage with in-memory caching.
pub struct JsonlStorage {
    base_path: PathBuf,
    cache: RwLock<Cache>,
}

impl std::fmt::Debug for JsonlStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStorage")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> CallwaveError {
    CallwaveError::Storage(e.to_string())
}

fn record_id(record: &serde_json::Value) -> Option<&str> {
    record.get("id").and_then(|v| v.as_str())
}

fn stamp(path: &Path) -> Result<Option<FileStamp>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(FileStamp {
            modified: meta.modified()?,
            len: meta.len(),
        })),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            records.push(serde_json::from_str(&line)?);
        }
    }
    Ok(records)
}

impl JsonlStorage {
    /// Create a new JsonlStorage at the given path.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Directory holding the collection files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a collection.
    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", collection))
    }

    /// Take the cross-process write lock for a collection. Released when the file drops.
    fn lock_collection(&self, collection: &str) -> Result<File> {
        let path = self.base_path.join(format!("{}.lock", collection));
        let file = OpenOptions::new().create(true).truncate(false).write(true).open(&path)?;
        file.lock()?;
        Ok(file)
    }

    /// Make sure the cached copy of a collection matches the file on disk.
    fn ensure_fresh(&self, collection: &str) -> Result<()> {
        let path = self.collection_path(collection);
        let current = stamp(&path)?;
        {
            let cache = self.cache.read().map_err(lock_err)?;
            if cache.get(collection).is_some_and(|loaded| loaded.stamp == current) {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().map_err(lock_err)?;
        let current = stamp(&path)?;
        if cache.get(collection).is_some_and(|loaded| loaded.stamp == current) {
            return Ok(());
        }
        log::debug!("Reloading collection {} from disk", collection);
        let records = read_records(&path)?;
        cache.insert(collection.to_string(), Loaded { stamp: current, records });
        Ok(())
    }

    /// Reload a collection unconditionally. Caller holds the collection lock.
    fn reload<'c>(&self, cache: &'c mut Cache, collection: &str) -> Result<&'c mut Loaded> {
        let path = self.collection_path(collection);
        let loaded = Loaded {
            stamp: stamp(&path)?,
            records: read_records(&path)?,
        };
        let slot = cache.entry(collection.to_string()).or_default();
        *slot = loaded;
        Ok(slot)
    }

    /// Append a record to the JSONL file.
    fn append_to_file(&self, collection: &str, record: &serde_json::Value) -> Result<()> {
        let path = self.collection_path(collection);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }

    /// Rewrite the entire collection file. Caller holds the collection lock.
    fn rewrite_file(&self, collection: &str, records: &[serde_json::Value]) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for record in records {
                writeln!(writer, "{}", serde_json::to_string(record)?)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Replace the record with `id`, optionally gated on the stored version.
    fn replace(&self, collection: &str, id: &str, value: serde_json::Value, expected: &[Filter]) -> Result<bool> {
        let mut cache = self.cache.write().map_err(lock_err)?;
        let _guard = self.lock_collection(collection)?;
        let loaded = self.reload(&mut cache, collection)?;

        let slot = loaded
            .records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| CallwaveError::not_found(collection, id))?;

        if !expected.iter().all(|f| f.matches(slot)) {
            return Ok(false);
        }
        *slot = value;

        self.rewrite_file(collection, &loaded.records)?;
        loaded.stamp = stamp(&self.collection_path(collection))?;
        Ok(true)
    }
}

impl Storage for JsonlStorage {
    fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;

        let mut cache = self.cache.write().map_err(lock_err)?;
        let _guard = self.lock_collection(collection)?;
        let loaded = self.reload(&mut cache, collection)?;

        if loaded.records.iter().any(|r| record_id(r) == Some(record.id())) {
            return Err(CallwaveError::Storage(format!(
                "Duplicate id in {}: {}",
                collection,
                record.id()
            )));
        }

        // Append to file first (source of truth)
        self.append_to_file(collection, &value)?;
        loaded.records.push(value);
        loaded.stamp = stamp(&self.collection_path(collection))?;

        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        self.ensure_fresh(collection)?;

        let cache = self.cache.read().map_err(lock_err)?;
        let loaded = cache
            .get(collection)
            .ok_or_else(|| CallwaveError::Storage(format!("Collection not loaded: {}", collection)))?;

        match loaded.records.iter().find(|r| record_id(r) == Some(id)) {
            Some(record) => Ok(Some(serde_json::from_value(record.clone())?)),
            None => Ok(None),
        }
    }

    fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.replace(collection, id, value, &[])?;
        Ok(())
    }

    fn update_if<T: Serialize + DeserializeOwned + HasId>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
        expected: &[Filter],
    ) -> Result<bool> {
        let value = serde_json::to_value(record)?;
        self.replace(collection, id, value, expected)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut cache = self.cache.write().map_err(lock_err)?;
        let _guard = self.lock_collection(collection)?;
        let loaded = self.reload(&mut cache, collection)?;

        let original_len = loaded.records.len();
        loaded.records.retain(|r| record_id(r) != Some(id));

        if loaded.records.len() == original_len {
            return Err(CallwaveError::not_found(collection, id));
        }

        self.rewrite_file(collection, &loaded.records)?;
        loaded.stamp = stamp(&self.collection_path(collection))?;
        Ok(())
    }

    fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>> {
        self.ensure_fresh(collection)?;

        let cache = self.cache.read().map_err(lock_err)?;
        let loaded = cache
            .get(collection)
            .ok_or_else(|| CallwaveError::Storage(format!("Collection not loaded: {}", collection)))?;

        let mut results = Vec::new();
        for record in &loaded.records {
            if filters.iter().all(|f| f.matches(record)) {
                results.push(serde_json::from_value(record.clone())?);
            }
        }

        Ok(results)
    }

    fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        self.query(collection, &[])
    }
}
