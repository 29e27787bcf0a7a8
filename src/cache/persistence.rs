//! Sled persistence for cache entries

use crate::cache::key::CacheKey;
use crate::cache::store::CacheEntry;
use crate::error::StorageError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// On-disk form of a cache entry.
///
/// The value is kept as JSON text because bincode cannot encode `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub key: String,
    pub value_json: String,
    pub fetched_at_ms: i64,
    pub ttl_ms: u64,
}

impl PersistedEntry {
    pub fn into_entry(self) -> Result<CacheEntry, StorageError> {
        let value = serde_json::from_str(&self.value_json)
            .map_err(|e| StorageError::Encoding(format!("Failed to decode cached value: {}", e)))?;
        let fetched_at: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.fetched_at_ms)
            .single()
            .ok_or_else(|| {
                StorageError::Encoding(format!("Invalid fetched_at timestamp {}", self.fetched_at_ms))
            })?;
        Ok(CacheEntry {
            key: CacheKey::from_raw(self.key),
            value,
            fetched_at,
            ttl: Duration::from_millis(self.ttl_ms),
        })
    }
}

/// Sled-backed write-through store for the cache.
pub struct SledCachePersistence {
    db: sled::Db,
}

impl SledCachePersistence {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Temporary database, removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Every stored entry still valid at `now`. Expired and undecodable rows are
    /// deleted on the way.
    pub fn load_all(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut expired = Vec::new();
        let mut corrupt = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let decoded = bincode::deserialize::<PersistedEntry>(&value)
                .map_err(|e| {
                    StorageError::Encoding(format!("Failed to deserialize cache entry: {}", e))
                })
                .and_then(PersistedEntry::into_entry);
            match decoded {
                Ok(entry) if entry.is_expired(now) => expired.push(key),
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(
                        key = %String::from_utf8_lossy(&key),
                        error = %e,
                        "Dropping undecodable cache entry"
                    );
                    corrupt.push(key);
                }
            }
        }
        for key in expired.iter().chain(corrupt.iter()) {
            self.db.remove(key)?;
        }
        if !expired.is_empty() {
            debug!(dropped = expired.len(), "Dropped expired persisted cache entries");
        }
        Ok(entries)
    }

    pub fn put(&self, entry: &PersistedEntry) -> Result<(), StorageError> {
        let value = bincode::serialize(entry).map_err(|e| {
            StorageError::Encoding(format!("Failed to serialize cache entry: {}", e))
        })?;
        self.db.insert(entry.key.as_bytes(), value)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<PersistedEntry>, StorageError> {
        match self.db.get(key.as_bytes())? {
            Some(value) => {
                let entry = bincode::deserialize(&value).map_err(|e| {
                    StorageError::Encoding(format!("Failed to deserialize cache entry: {}", e))
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    pub fn remove_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys: Vec<sled::IVec> = self
            .db
            .scan_prefix(prefix.as_bytes())
            .keys()
            .collect::<Result<_, _>>()?;
        for key in &keys {
            self.db.remove(key)?;
        }
        Ok(keys.len())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}
