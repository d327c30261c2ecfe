//! Store abstraction and the in-memory backend
//!
//! `CacheStore` is the seam to the underlying key-value engine. Only the four
//! primitive operations are required; `remember`, `remember_forever` and
//! `update_forever` have read-then-write default implementations that a
//! backend can replace with native equivalents.

use crate::cache::{
    entry::CacheEntry,
    types::{CacheKey, CacheStats, CacheValue},
};
use crate::error::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Deferred computation run by `remember` on a miss
pub type Compute<'a> = BoxFuture<'a, Result<CacheValue>>;

/// Transformation applied by `update_forever` to the current value
pub type Update = Box<dyn FnOnce(Option<CacheValue>) -> Result<CacheValue> + Send>;

/// Underlying key-value store used for cached results and the key index
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a live value
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Write a value that expires after `ttl`
    async fn put(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()>;

    /// Write a value that never expires
    async fn forever(&self, key: &str, value: CacheValue) -> Result<()>;

    /// Remove a value; returns whether something was removed
    async fn forget(&self, key: &str) -> Result<bool>;

    /// Return the cached value, or run `compute` and store its result for `ttl`
    async fn remember(&self, key: &str, ttl: Duration, compute: Compute<'_>) -> Result<CacheValue> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = compute.await?;
        self.put(key, value.clone(), ttl).await?;
        Ok(value)
    }

    /// Return the cached value, or run `compute` and store its result forever
    async fn remember_forever(&self, key: &str, compute: Compute<'_>) -> Result<CacheValue> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = compute.await?;
        self.forever(key, value.clone()).await?;
        Ok(value)
    }

    /// Replace the value under `key` with `update(current)`, stored forever.
    ///
    /// The default is a plain read-modify-write: two concurrent callers can
    /// interleave and the later write wins. Backends with an atomic update
    /// primitive should override this.
    async fn update_forever(&self, key: &str, update: Update) -> Result<CacheValue> {
        let current = self.get(key).await?;
        let next = update(current)?;
        self.forever(key, next.clone()).await?;
        Ok(next)
    }
}

/// In-process store with optional expiry per entry
///
/// Cloning yields a handle to the same storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Current cache statistics
    stats: CacheStats,
}

impl MemoryInner {
    /// Look up a live entry, dropping it if it has expired
    fn live_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let expired = self.entries.get(key).map(CacheEntry::is_expired)?;
        if expired {
            debug!("Cache entry expired: {}", key);
            self.entries.remove(key);
            self.stats.expirations += 1;
            self.stats.entries = self.entries.len();
            return None;
        }
        self.entries.get_mut(key)
    }

    fn store(&mut self, entry: CacheEntry) {
        debug!("Storing cache entry: {}", entry.key);
        self.entries.insert(entry.key.clone(), entry);
        self.stats.writes += 1;
        self.stats.entries = self.entries.len();
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Initializing in-memory cache store");
        Self::default()
    }

    /// Check if a live key exists (without updating access time)
    pub async fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Vec<CacheKey> {
        let inner = self.inner.read().await;
        let mut keys: Vec<CacheKey> = inner.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove all entries
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.entries.len();
        inner.entries.clear();
        inner.stats.entries = 0;
        inner.stats.invalidations += count as u64;
        info!("Cleared {} entries from cache", count);
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - inner.entries.len();

        inner.stats.expirations += removed as u64;
        inner.stats.entries = inner.entries.len();

        if removed > 0 {
            debug!("Cleaned up {} expired entries", removed);
        }
        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats.clone()
    }

    /// Get number of entries in cache
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut inner = self.inner.write().await;

        let value = inner.live_mut(key).map(|entry| {
            entry.mark_accessed();
            entry.value.clone()
        });

        if value.is_some() {
            debug!("Cache hit: {}", key);
            inner.stats.hits += 1;
        } else {
            debug!("Cache miss: {}", key);
            inner.stats.misses += 1;
        }

        Ok(value)
    }

    async fn put(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key.to_string(), value, ttl);
        self.inner.write().await.store(entry);
        Ok(())
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        let entry = CacheEntry::forever(key.to_string(), value);
        self.inner.write().await.store(entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;

        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.stats.entries = inner.entries.len();
            inner.stats.invalidations += 1;
            debug!("Removed cache entry: {}", key);
        }
        Ok(removed)
    }

    async fn update_forever(&self, key: &str, update: Update) -> Result<CacheValue> {
        // The write lock is held across read and write, so concurrent
        // updates of the same key are serialized.
        let mut inner = self.inner.write().await;

        let current = inner.live_mut(key).map(|entry| entry.value.clone());
        let next = update(current)?;
        inner.store(CacheEntry::forever(key.to_string(), next.clone()));

        Ok(next)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}
