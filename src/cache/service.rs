//! Owner-facing cache surface
//!
//! A concrete service embeds a [`ServiceCache`] and implements [`Cacheable`]
//! so callers can flush it without knowing its keys.

use crate::cache::{
    config::{CacheConfig, CachePolicy},
    index::KeyIndex,
    invalidation::{FlushReport, InvalidationEngine},
    orchestrator::CacheOrchestrator,
    store::CacheStore,
    types::{qualify, service_id_of, CacheKey, CacheValue, ServiceId},
};
use crate::error::Result;
use crate::source::DataSource;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Cache handle bound to one service identifier and policy
#[derive(Clone)]
pub struct ServiceCache {
    service_id: ServiceId,
    policy: CachePolicy,
    index: KeyIndex,
    orchestrator: CacheOrchestrator,
    invalidation: InvalidationEngine,
}

impl ServiceCache {
    /// Create a cache handle for `service_id` using `config`'s index key and
    /// default policy
    pub fn new(
        service_id: impl Into<ServiceId>,
        store: Arc<dyn CacheStore>,
        config: &CacheConfig,
    ) -> Self {
        let index = KeyIndex::new(store.clone(), config.index_key.clone());

        Self {
            service_id: service_id.into(),
            policy: config.policy.clone(),
            orchestrator: CacheOrchestrator::new(store.clone(), index.clone()),
            invalidation: InvalidationEngine::new(store, index.clone()),
            index,
        }
    }

    /// Create a cache handle identified by `T`'s type name
    pub fn for_type<T: ?Sized>(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self::new(service_id_of::<T>(), store, config)
    }

    /// Replace the policy
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut CachePolicy {
        &mut self.policy
    }

    pub fn key_index(&self) -> &KeyIndex {
        &self.index
    }

    /// Fully-qualified key for `suffix`
    pub fn cache_key(&self, suffix: Option<&str>) -> CacheKey {
        qualify(&self.service_id, suffix.unwrap_or_default())
    }

    /// Serve `suffix` from cache, running `verb` against `source` on a miss
    pub async fn cache_or_fetch<D>(
        &self,
        suffix: Option<&str>,
        source: &D,
        verb: &str,
    ) -> Result<CacheValue>
    where
        D: DataSource + ?Sized,
    {
        self.orchestrator
            .cache_or_fetch(&self.service_id, suffix, source, verb, &self.policy)
            .await
    }

    /// Serve `suffix` from cache, running `fetch` on a miss
    pub async fn cache_or_else<'a, F, Fut>(&'a self, suffix: Option<&'a str>, fetch: F) -> Result<CacheValue>
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<CacheValue>> + Send + 'a,
    {
        self.orchestrator
            .cache_or_else(&self.service_id, suffix, &self.policy, fetch)
            .await
    }

    /// Indexed suffixes of this service, optionally filtered by `pattern`
    pub async fn service_keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        self.index.service_keys(&self.service_id, pattern).await
    }

    /// Forget this service's keys, optionally only those matching `pattern`
    pub async fn flush(&self, pattern: Option<&str>) -> Result<FlushReport> {
        self.invalidation
            .flush(&self.service_id, &self.policy, pattern)
            .await
    }
}

impl std::fmt::Debug for ServiceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCache")
            .field("service_id", &self.service_id)
            .field("policy", &self.policy)
            .field("index", &self.index)
            .finish()
    }
}

/// A service whose results are cached and can be flushed
#[async_trait]
pub trait Cacheable: Send + Sync {
    /// The service's cache handle
    fn cache(&self) -> &ServiceCache;

    /// Stable service identifier
    fn cache_key(&self) -> &str {
        self.cache().service_id()
    }

    /// Flush the cache for the concrete service
    async fn flush_cache(&self, pattern: Option<&str>) -> Result<FlushReport> {
        self.cache().flush(pattern).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::source::RecordSet;
    use serde_json::json;

    struct OrderService {
        cache: ServiceCache,
        orders: RecordSet,
    }

    impl OrderService {
        fn new(store: Arc<dyn CacheStore>) -> Self {
            Self {
                cache: ServiceCache::for_type::<Self>(store, &CacheConfig::default()),
                orders: RecordSet::new(vec![
                    json!({ "id": 1, "status": "open" }),
                    json!({ "id": 2, "status": "closed" }),
                ]),
            }
        }

        async fn all(&self) -> Result<CacheValue> {
            self.cache.cache_or_fetch(Some("all"), &self.orders, "get").await
        }

        async fn count(&self) -> Result<CacheValue> {
            self.cache.cache_or_fetch(Some("count"), &self.orders, "count").await
        }
    }

    impl Cacheable for OrderService {
        fn cache(&self) -> &ServiceCache {
            &self.cache
        }
    }

    #[tokio::test]
    async fn test_service_uses_type_name() {
        let store = MemoryStore::new();
        let service = OrderService::new(Arc::new(store.clone()));

        assert_eq!(service.cache_key(), "OrderService");
        assert_eq!(service.cache.cache_key(Some("all")), "OrderService.all");
        assert_eq!(service.cache.cache_key(None), "OrderService");

        service.all().await.unwrap();
        assert!(store.contains_key("OrderService.all").await);
    }

    #[tokio::test]
    async fn test_flush_cache_through_trait() {
        let store = MemoryStore::new();
        let service = OrderService::new(Arc::new(store.clone()));

        service.all().await.unwrap();
        service.count().await.unwrap();
        assert_eq!(service.cache.service_keys(None).await.unwrap(), vec!["all", "count"]);

        let report = service.flush_cache(Some("count")).await.unwrap();

        assert_eq!(report.flushed, vec!["OrderService.count"]);
        assert!(store.contains_key("OrderService.all").await);
        assert!(!store.contains_key("OrderService.count").await);
        assert_eq!(service.cache.service_keys(None).await.unwrap(), vec!["all"]);
    }

    #[tokio::test]
    async fn test_policy_is_owned_by_service() {
        let store = MemoryStore::new();
        let mut service = OrderService::new(Arc::new(store.clone()));

        service.cache.policy_mut().caching_enabled = false;
        service.all().await.unwrap();

        assert!(!store.contains_key("OrderService.all").await);
        assert_eq!(service.cache.service_keys(None).await.unwrap(), vec!["all"]);
    }
}
