//! Persistent storage collaborator used for cache snapshots.
//!
//! Durability is best-effort: write failures are logged and swallowed so
//! the in-memory cache keeps working when the backing store does not.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Key/value JSON storage.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value);
}

/// File-backed store writing one JSON file per key under a directory.
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %path.display(), %err, "discarding unreadable cache snapshot");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) {
        if let Err(err) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), %err, "failed to create cache directory");
            return;
        }
        let body = match serde_json::to_vec(&value) {
            Ok(body) => body,
            Err(err) => {
                warn!(%key, %err, "failed to serialize cache snapshot");
                return;
            }
        };
        let path = self.path_for(key);
        if let Err(err) = tokio::fs::write(&path, body).await {
            warn!(path = %path.display(), %err, "failed to persist cache snapshot");
        }
    }
}

/// In-memory store, primarily for tests.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().to_path_buf());
        store.set("marketplace-cache-v1", json!({"a": 1})).await;
        assert_eq!(store.get("marketplace-cache-v1").await, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().to_path_buf());
        store.set("https://example.com/a", json!(true)).await;
        assert_eq!(store.get("https://example.com/a").await, Some(json!(true)));
        // no nested directories were created by the slashes in the key
        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        assert!(entries.all(|e| e.unwrap().file_type().unwrap().is_file()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().to_path_buf());
        assert!(store.get("absent").await.is_none());
    }
}
