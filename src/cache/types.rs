//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified cache key as used by the underlying store
pub type CacheKey = String;

/// Cached values and the key index record share one JSON representation
pub type CacheValue = serde_json::Value;

/// Identifier of a logical cache owner
pub type ServiceId = String;

/// Separator between the service identifier and a key suffix
pub const KEY_SEPARATOR: char = '.';

/// Build the fully-qualified key for a service and suffix.
///
/// An empty suffix yields the bare service identifier.
pub fn qualify(service: &str, suffix: &str) -> CacheKey {
    if suffix.is_empty() {
        service.to_string()
    } else {
        format!("{}{}{}", service, KEY_SEPARATOR, suffix)
    }
}

/// Default service identifier for an owner type: the last segment of its
/// type path, without generic parameters.
pub fn service_id_of<T: ?Sized>() -> ServiceId {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Statistics for a store, used by the in-memory backend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Number of entries currently in cache
    pub entries: usize,

    /// Number of writes (put or forever)
    pub writes: u64,

    /// Number of entries removed by `forget`
    pub invalidations: u64,

    /// Number of entries dropped because their expiry passed
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, writes: {}, invalidations: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.writes,
            self.invalidations
        )
    }
}
