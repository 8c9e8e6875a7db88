//! Two-threshold TTL cache with stale-while-revalidate reads.
//!
//! Entries carry a creation timestamp and are judged against two
//! independent thresholds: below `fresh_ttl` data needs no refresh, beyond
//! `stale_ttl` it is discarded entirely. In between, reads serve the stale
//! value immediately and schedule a deduplicated background refresh.
//!
//! Uses interior mutability with `RwLock` to allow `&self` methods. Locks
//! are never held across await points; all map mutation happens between
//! suspension points.

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::storage::CacheStore;

/// Age below which cached data needs no refresh.
pub const DEFAULT_FRESH_TTL: Duration = Duration::from_secs(300);

/// Age beyond which cached data is discarded rather than served stale.
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(86_400);

/// One cached value. Entries are superseded on refresh, never mutated in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub data: V,
    /// Epoch milliseconds at creation.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl<V> CacheEntry<V> {
    fn age(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.timestamp))
    }
}

/// A value read from the cache.
#[derive(Debug, Clone)]
pub struct CachedValue<V> {
    pub data: V,
    /// Age was within the fresh threshold at read time.
    pub is_fresh: bool,
    pub etag: Option<String>,
}

/// A freshly fetched value plus its optional validator.
#[derive(Debug, Clone)]
pub struct FetchedValue<V> {
    pub data: V,
    pub etag: Option<String>,
}

impl<V> FetchedValue<V> {
    pub fn new(data: V) -> Self {
        Self { data, etag: None }
    }
}

/// Outcome of a read-through fetch.
#[derive(Debug, Clone)]
pub struct RefreshedValue<V> {
    pub data: V,
    /// The returned data came from the cache rather than the network.
    pub from_cache: bool,
    /// A background refresh is underway for this key.
    pub refreshing: bool,
}

pub struct TtlCache<V> {
    entries: RwLock<FxHashMap<String, CacheEntry<V>>>,
    /// Keys with a background refresh in flight.
    in_flight: Mutex<FxHashSet<String>>,
    fresh_ttl: Duration,
    stale_ttl: Duration,
    store: Option<Arc<dyn CacheStore>>,
    store_key: String,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(fresh_ttl: Duration, stale_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            in_flight: Mutex::new(FxHashSet::default()),
            fresh_ttl,
            stale_ttl,
            store: None,
            store_key: String::new(),
        }
    }

    /// Cache persisting its full map to `store` under `store_key` on every
    /// mutation.
    pub fn with_store(
        fresh_ttl: Duration,
        stale_ttl: Duration,
        store: Arc<dyn CacheStore>,
        store_key: impl Into<String>,
    ) -> Self {
        Self {
            store: Some(store),
            store_key: store_key.into(),
            ..Self::new(fresh_ttl, stale_ttl)
        }
    }

    /// Reload the persisted snapshot, dropping entries already past the
    /// stale threshold.
    pub async fn load_persisted(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let Some(snapshot) = store.get(&self.store_key).await else {
            return;
        };
        let loaded: FxHashMap<String, CacheEntry<V>> = match serde_json::from_value(snapshot) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(%err, "discarding incompatible cache snapshot");
                return;
            }
        };
        let now = now_millis();
        let stale_ttl = self.stale_ttl;
        let retained: FxHashMap<String, CacheEntry<V>> = loaded
            .into_iter()
            .filter(|(_, entry)| entry.age(now) <= stale_ttl)
            .collect();
        debug!(entries = retained.len(), "loaded cache snapshot");
        if let Ok(mut entries) = self.entries.write() {
            *entries = retained;
        }
    }

    /// Read one key. An entry past the stale threshold is evicted and
    /// reported absent.
    pub fn get(&self, key: &str) -> Option<CachedValue<V>> {
        let now = now_millis();
        let age = {
            let entries = self.entries.read().ok()?;
            entries.get(key)?.age(now)
        };
        if age > self.stale_ttl {
            if let Ok(mut entries) = self.entries.write() {
                let still_stale = entries
                    .get(key)
                    .map(|entry| entry.age(now) > self.stale_ttl)
                    .unwrap_or(false);
                if still_stale {
                    entries.remove(key);
                }
            }
            self.persist();
            return None;
        }
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        Some(CachedValue {
            data: entry.data.clone(),
            is_fresh: entry.age(now) <= self.fresh_ttl,
            etag: entry.etag.clone(),
        })
    }

    /// Insert a new entry, superseding any previous one.
    pub fn insert(&self, key: &str, data: V, etag: Option<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    data,
                    timestamp: now_millis(),
                    etag,
                },
            );
        }
        self.persist();
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
        self.persist();
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-through fetch with stale-while-revalidate semantics.
    ///
    /// - absent entry or `force_refresh`: fetch synchronously; on failure
    ///   fall back to any cached value, else propagate the error.
    /// - fresh entry: returned as-is, no network activity.
    /// - stale entry: returned immediately with `refreshing: true` and a
    ///   background refresh scheduled, at most one in flight per key.
    ///
    /// A forced refresh does not cancel an in-flight background refresh;
    /// both complete and the map is last-writer-wins. The fetch is an
    /// idempotent GET, so the duplicate work is tolerated.
    pub async fn get_with_refresh<F, Fut>(
        self: &Arc<Self>,
        key: &str,
        force_refresh: bool,
        fetch: F,
    ) -> Result<RefreshedValue<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FetchedValue<V>>> + Send + 'static,
    {
        let cached = self.get(key);
        match cached {
            Some(cached) if !force_refresh && cached.is_fresh => Ok(RefreshedValue {
                data: cached.data,
                from_cache: true,
                refreshing: false,
            }),
            Some(cached) if !force_refresh => {
                self.schedule_refresh(key, fetch());
                Ok(RefreshedValue {
                    data: cached.data,
                    from_cache: true,
                    refreshing: true,
                })
            }
            cached => match fetch().await {
                Ok(fetched) => {
                    self.insert(key, fetched.data.clone(), fetched.etag);
                    Ok(RefreshedValue {
                        data: fetched.data,
                        from_cache: false,
                        refreshing: false,
                    })
                }
                Err(err) => match cached {
                    Some(stale) => {
                        warn!(%key, err = %format!("{err:#}"), "fetch failed; serving cached value");
                        Ok(RefreshedValue {
                            data: stale.data,
                            from_cache: true,
                            refreshing: false,
                        })
                    }
                    None => Err(err),
                },
            },
        }
    }

    /// Spawn a background refresh unless one is already in flight for the
    /// key. Completion always clears the in-flight marker; failures are
    /// logged and swallowed.
    fn schedule_refresh<Fut>(self: &Arc<Self>, key: &str, fetch: Fut)
    where
        Fut: Future<Output = Result<FetchedValue<V>>> + Send + 'static,
    {
        {
            let Ok(mut in_flight) = self.in_flight.lock() else {
                return;
            };
            if !in_flight.insert(key.to_string()) {
                trace!(%key, "background refresh already in flight");
                return;
            }
        }
        let cache = Arc::clone(self);
        let key = key.to_string();
        tokio::spawn(async move {
            match fetch.await {
                Ok(fetched) => {
                    debug!(%key, "background refresh complete");
                    cache.insert(&key, fetched.data, fetched.etag);
                }
                Err(err) => debug!(%key, err = %format!("{err:#}"), "background refresh failed"),
            }
            if let Ok(mut in_flight) = cache.in_flight.lock() {
                in_flight.remove(&key);
            }
        });
    }

    /// Fire-and-forget snapshot write. A crash between a mutation and the
    /// spawned write loses that mutation; durability here is explicitly
    /// best-effort.
    fn persist(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let snapshot = {
            let Ok(entries) = self.entries.read() else {
                return;
            };
            match serde_json::to_value(&*entries) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(%err, "failed to serialize cache snapshot");
                    return;
                }
            }
        };
        let key = self.store_key.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    store.set(&key, snapshot).await;
                });
            }
            Err(_) => trace!("no async runtime; skipping cache persistence"),
        }
    }
}
