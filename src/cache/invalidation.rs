//! Pattern-based invalidation
//!
//! Flushing resolves a service's indexed suffixes (optionally filtered by a
//! full-match regex), forgets each qualified key, and reports the outcome.
//! A failing `forget` is recorded and skipped; it never stops the remaining
//! keys.

use crate::cache::{
    config::CachePolicy,
    index::KeyIndex,
    store::CacheStore,
    types::{qualify, CacheKey, ServiceId},
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A key that could not be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushFailure {
    pub key: CacheKey,
    pub error: String,
}

/// Outcome of a flush
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushReport {
    /// Service whose keys were flushed
    pub service: ServiceId,

    /// Pattern the suffixes were filtered with, if any
    pub pattern: Option<String>,

    /// Fully-qualified keys removed from the store, in index order
    pub flushed: Vec<CacheKey>,

    /// Keys whose removal failed
    pub failed: Vec<FlushFailure>,

    /// Whether the flushed suffixes were removed from the index
    pub pruned: bool,

    /// When the flush ran
    pub timestamp: DateTime<Utc>,
}

impl FlushReport {
    fn new(service: &str, pattern: Option<&str>) -> Self {
        Self {
            service: service.to_string(),
            pattern: pattern.map(str::to_string),
            flushed: Vec::new(),
            failed: Vec::new(),
            pruned: false,
            timestamp: Utc::now(),
        }
    }

    /// True when every resolved key was removed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of keys removed
    pub fn len(&self) -> usize {
        self.flushed.len()
    }

    /// True when nothing was removed
    pub fn is_empty(&self) -> bool {
        self.flushed.is_empty()
    }
}

/// Removes a service's cached keys from the store
#[derive(Clone)]
pub struct InvalidationEngine {
    store: Arc<dyn CacheStore>,
    index: KeyIndex,
}

impl InvalidationEngine {
    pub fn new(store: Arc<dyn CacheStore>, index: KeyIndex) -> Self {
        Self { store, index }
    }

    /// Forget every key of `service` whose suffix fully matches `pattern`
    /// (all keys when `pattern` is `None`).
    pub async fn flush(
        &self,
        service: &str,
        policy: &CachePolicy,
        pattern: Option<&str>,
    ) -> Result<FlushReport> {
        let suffixes = self.index.service_keys(service, pattern).await?;
        let mut report = FlushReport::new(service, pattern);

        // Prune before forgetting; a concurrent refill then re-indexes its key.
        if policy.prune_on_flush {
            self.index.remove_service_keys(service, &suffixes).await?;
            report.pruned = true;
        }

        let mut kept = Vec::new();
        for suffix in suffixes {
            let key = qualify(service, &suffix);

            if policy.logging_enabled {
                info!("Flushing cache for {} ({})", service, key);
            }

            match self.store.forget(&key).await {
                Ok(_) => report.flushed.push(key),
                Err(e) => {
                    warn!("Failed to flush {}: {}", key, e);
                    report.failed.push(FlushFailure {
                        key,
                        error: e.to_string(),
                    });
                    kept.push(suffix);
                }
            }
        }

        if policy.prune_on_flush {
            self.index.add_service_keys(service, &kept).await?;
        }

        debug!(
            "Flushed {} keys for {} ({} failed)",
            report.flushed.len(),
            service,
            report.failed.len()
        );

        Ok(report)
    }
}
