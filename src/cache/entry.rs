//! Stored entries for the in-memory backend

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored value with optional expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

/// Bookkeeping attached to every entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// When the entry was last read
    pub accessed_at: DateTime<Utc>,

    /// When the entry stops being served; `None` keeps it forever
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of reads served from this entry
    pub access_count: u64,
}

impl CacheEntry {
    /// Create an entry that expires after `ttl`
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        // Saturate absurdly long lifetimes to "forever"
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));

        Self::build(key, value, now, expires_at)
    }

    /// Create an entry that never expires
    pub fn forever(key: CacheKey, value: CacheValue) -> Self {
        Self::build(key, value, Utc::now(), None)
    }

    fn build(
        key: CacheKey,
        value: CacheValue,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        match self.metadata.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }
}
