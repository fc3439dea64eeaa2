use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// A stored dataset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    /// Opaque aggregate bundle, decoded by the consumer that knows its type.
    pub data: Value,
    /// Write time, epoch milliseconds. Freshness is derived from this at
    /// read time against the consumer's TTL, never stored.
    pub timestamp: i64,
}

impl CacheEntry {
    /// Fresh while the entry's age has not exceeded `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let age_ms = now_ms.saturating_sub(self.timestamp);
        age_ms <= ttl.as_millis() as i64
    }
}

/// Durable local key-value store for dataset bundles.
///
/// One JSON file per dataset id. `save` always overwrites and stamps the
/// current time; `get` returns whatever is stored and leaves the freshness
/// decision to the caller, which keeps TTL policy per-dataset. A store that
/// cannot be read or written degrades to a forced cache miss: the caller
/// refetches and only loses the performance benefit.
///
/// Writes go through a temp file plus rename, so a reader racing a writer
/// observes either the old or the new entry, never a torn one.
#[derive(Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Serialize `data` and overwrite the entry for `id`, stamping the
    /// current time.
    pub async fn save<T: Serialize>(&self, id: &str, data: &T) -> Result<(), FetchError> {
        let entry = CacheEntry {
            id: id.to_string(),
            data: serde_json::to_value(data).map_err(|e| write_failed(id, &e))?,
            timestamp: Utc::now().timestamp_millis(),
        };
        let body = serde_json::to_vec(&entry).map_err(|e| write_failed(id, &e))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_failed(id, &e))?;

        let path = self.path_for(id);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body)
            .await
            .map_err(|e| write_failed(id, &e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| write_failed(id, &e))?;

        Ok(())
    }

    /// Read the entry for `id`. `None` on absence and on any read or decode
    /// failure, which is logged and treated as a miss.
    pub async fn get(&self, id: &str) -> Option<CacheEntry> {
        let path = self.path_for(id);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("{}, treating as miss", read_failed(id, &e));
                return None;
            },
        };

        match serde_json::from_slice(&body) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("{}, treating as miss", read_failed(id, &e));
                None
            },
        }
    }

    /// Remove every stored entry. Missing directory counts as already clear.
    pub async fn clear(&self) -> Result<(), FetchError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(write_failed("*", &e)),
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                        if let Err(e) = tokio::fs::remove_file(&path).await {
                            warn!("Failed to remove cache file {}: {}", path.display(), e);
                        }
                    }
                },
                Ok(None) => break,
                Err(e) => return Err(write_failed("*", &e)),
            }
        }

        Ok(())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        Path::new(&self.dir).join(format!("{id}.json"))
    }
}

fn write_failed(id: &str, error: &dyn std::fmt::Display) -> FetchError {
    FetchError::CacheWrite {
        id: id.to_string(),
        reason: error.to_string(),
    }
}

fn read_failed(id: &str, error: &dyn std::fmt::Display) -> FetchError {
    FetchError::CacheRead {
        id: id.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    #[tokio::test]
    async fn test_save_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        store
            .save("ecosystemData", &serde_json::json!({"chains": 42}))
            .await
            .unwrap();

        let entry = store.get("ecosystemData").await.unwrap();
        assert_eq!(entry.id, "ecosystemData");
        assert_eq!(entry.data, serde_json::json!({"chains": 42}));
        assert!(entry.timestamp > 0);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        store.save("tpsData", &serde_json::json!(1)).await.unwrap();
        store.save("tpsData", &serde_json::json!(2)).await.unwrap();

        let entry = store.get("tpsData").await.unwrap();
        assert_eq!(entry.data, serde_json::json!(2));
    }

    #[tokio::test]
    async fn test_get_missing_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(store.get("ecosystemData").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_entry_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("ecosystemData.json"), b"not json")
            .await
            .unwrap();

        assert!(store.get("ecosystemData").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        store.save("a", &serde_json::json!(1)).await.unwrap();
        store.save("b", &serde_json::json!(2)).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.get("a").await.is_none());
        assert!(store.get("b").await.is_none());
    }

    #[test]
    fn test_freshness_boundary() {
        let entry = CacheEntry {
            id: "ecosystemData".to_string(),
            data: Value::Null,
            timestamp: 0,
        };
        let ttl = Duration::from_secs(6 * 3600);

        // Fresh one minute before the boundary, stale one minute after.
        assert!(entry.is_fresh(ttl, 6 * HOUR_MS - 60_000));
        assert!(!entry.is_fresh(ttl, 6 * HOUR_MS + 60_000));
    }
}
