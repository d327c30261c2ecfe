//! # query-cache
//!
//! Query-result caching with per-service key indexing and pattern-based
//! invalidation.
//!
//! ## Overview
//!
//! A service asks for a result by key suffix and names the query to run on a
//! miss. The cache qualifies the key with the service identifier
//! (`Orders.active`), records the suffix in a global key index kept in the
//! same store, and either returns the stored value or runs the query and
//! stores its result.
//!
//! Because every key a service produces is indexed, the service can flush
//! all of them, or only those whose suffix fully matches a regex:
//!
//! ```no_run
//! use query_cache::cache::{CacheConfig, CacheStore, MemoryStore, ServiceCache};
//! use query_cache::source::RecordSet;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
//!     let config = CacheConfig::from_env()?;
//!     let cache = ServiceCache::new("Orders", store, &config);
//!
//!     let orders = RecordSet::new(vec![json!({ "id": 1 }), json!({ "id": 2 })]);
//!     let page = cache.cache_or_fetch(Some("page.1"), &orders, "paginate:15,id").await?;
//!     println!("{}", page);
//!
//!     // Forget only the paginated results
//!     let report = cache.flush(Some(r"page\.[0-9]+")).await?;
//!     println!("flushed {} keys", report.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Stores and data sources
//!
//! The store is any [`cache::CacheStore`]; [`cache::MemoryStore`] is the
//! in-process implementation. Queries run against a [`source::DataSource`];
//! [`source::RecordSet`] is an in-memory table of JSON records.

pub mod cache;
pub mod error;
pub mod source;
pub mod telemetry;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheKey, CacheOrchestrator, CachePolicy, CacheStore, CacheValue, Cacheable,
    FlushReport, InvalidationEngine, KeyIndex, MemoryStore, ServiceCache, Verb, VerbArg,
};
pub use error::{CacheError, Result};
pub use source::{filter_by_attribute, DataSource, RecordSet};
