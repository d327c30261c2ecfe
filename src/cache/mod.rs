//! # Service Query Cache
//!
//! This module caches the results of data source queries per logical owner
//! ("service") and keeps an index of which keys each service has produced,
//! so a service can later flush all of its keys or only those matching a
//! regular expression.
//!
//! ## Features
//!
//! - **Get-or-fetch**: results are served from the store when present and
//!   fetched exactly once on a miss
//! - **TTL or forever**: per-service policy chooses expiring or permanent entries
//! - **Key index**: one record in the store maps each service to its key suffixes
//! - **Pattern flush**: full-match regex selection of keys to forget, with
//!   optional pruning of the index
//! - **Verb strings**: `"paginate:15,id|name"` names the query run on a miss
//!
//! ## Example
//!
//! ```rust
//! use query_cache::cache::{CacheConfig, CacheStore, MemoryStore, ServiceCache};
//! use query_cache::source::RecordSet;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> query_cache::Result<()> {
//! let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
//! let orders = RecordSet::new(vec![json!({ "id": 1, "status": "open" })]);
//!
//! let cache = ServiceCache::new("Orders", store, &CacheConfig::default());
//!
//! // First call runs the query, second is a cache hit
//! let open = cache.cache_or_fetch(Some("open"), &orders, "get").await?;
//! let again = cache.cache_or_fetch(Some("open"), &orders, "get").await?;
//! assert_eq!(open, again);
//!
//! // Forget every key of this service
//! cache.flush(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod index;
pub mod invalidation;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod types;
pub mod verb;

pub use config::{CacheConfig, CachePolicy, CachePolicyBuilder, DEFAULT_INDEX_KEY};
pub use entry::{CacheEntry, CacheMetadata};
pub use index::{compile_pattern, GlobalIndex, KeyIndex};
pub use invalidation::{FlushFailure, FlushReport, InvalidationEngine};
pub use orchestrator::CacheOrchestrator;
pub use service::{Cacheable, ServiceCache};
pub use store::{CacheStore, Compute, MemoryStore, Update};
pub use types::{qualify, service_id_of, CacheKey, CacheStats, CacheValue, ServiceId};
pub use verb::{Verb, VerbArg, DEFAULT_VERB};
