//! Walks through caching and flushing for an order service
//!
//! This example shows how to:
//! - Load cache settings from the environment (and `.env`)
//! - Cache query results per service
//! - Flush keys by pattern
//!
//! Run with `RUST_LOG=query_cache=debug cargo run --example orders` to see
//! store hits and misses.

use query_cache::cache::{CacheConfig, CacheStore, Cacheable, MemoryStore, ServiceCache};
use query_cache::error::Result;
use query_cache::source::{filter_by_attribute, RecordSet};
use query_cache::telemetry;
use serde_json::{json, Value};
use std::sync::Arc;

struct OrderService {
    cache: ServiceCache,
    orders: RecordSet,
}

impl OrderService {
    fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        let orders = (1..=40)
            .map(|id| {
                let status = if id % 3 == 0 { "shipped" } else { "open" };
                json!({ "id": id, "status": status, "total": id * 25 })
            })
            .collect();

        Self {
            cache: ServiceCache::for_type::<Self>(store, config),
            orders: RecordSet::new(orders),
        }
    }

    async fn all(&self) -> Result<Value> {
        self.cache.cache_or_fetch(Some("all"), &self.orders, "get").await
    }

    async fn page(&self, page: usize) -> Result<Value> {
        let suffix = format!("page.{}", page);
        let verb = format!("paginate:10,id|status,{}", page);
        self.cache.cache_or_fetch(Some(&suffix), &self.orders, &verb).await
    }

    async fn shipped(&self) -> Result<Vec<Value>> {
        let all = self.all().await?;
        let items = all.as_array().cloned().unwrap_or_default();
        Ok(filter_by_attribute(&items, "status", Some(&json!("shipped"))))
    }
}

impl Cacheable for OrderService {
    fn cache(&self) -> &ServiceCache {
        &self.cache
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    let config = CacheConfig::from_env()?;
    println!("Cache policy: {:?}", config.policy);

    let memory = MemoryStore::new();
    let store: Arc<dyn CacheStore> = Arc::new(memory.clone());
    let service = OrderService::new(store, &config);

    // 1. Fill the cache
    println!("\n1. Caching queries for {}...", service.cache_key());
    for page in 1..=4 {
        let result = service.page(page).await?;
        println!("   page {} -> {} rows", page, result["data"].as_array().map_or(0, Vec::len));
    }
    println!("   shipped orders: {}", service.shipped().await?.len());

    // 2. Repeat a query; served from the store
    println!("\n2. Repeating a query...");
    service.page(1).await?;
    let stats = memory.stats().await;
    println!("   {}", stats);
    println!("   miss rate: {:.2}%", stats.miss_rate());

    // 3. Inspect the key index
    println!("\n3. Indexed keys: {:?}", service.cache.service_keys(None).await?);

    // 4. Flush only the paginated results
    println!("\n4. Flushing pages 1-2...");
    let report = service.flush_cache(Some(r"page\.[12]")).await?;
    println!("   flushed: {:?}", report.flushed);
    println!("   remaining keys: {:?}", service.cache.service_keys(None).await?);

    // 5. Flush everything
    println!("\n5. Flushing everything...");
    let report = service.flush_cache(None).await?;
    println!("   flushed {} keys, store now holds {:?}", report.len(), memory.keys().await);

    // 6. Housekeeping
    println!("\n6. Dropping expired entries and resetting the store...");
    println!("   expired entries removed: {}", memory.cleanup_expired().await);
    memory.clear().await;
    println!("   store empty: {}", memory.is_empty().await);

    Ok(())
}
