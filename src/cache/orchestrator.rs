//! Get-or-fetch over the underlying store

use crate::cache::{
    config::CachePolicy,
    index::KeyIndex,
    store::{CacheStore, Compute},
    types::CacheValue,
    verb::Verb,
};
use crate::error::Result;
use crate::source::DataSource;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Serves cached results and fills the store on misses
#[derive(Clone)]
pub struct CacheOrchestrator {
    store: Arc<dyn CacheStore>,
    index: KeyIndex,
}

impl CacheOrchestrator {
    pub fn new(store: Arc<dyn CacheStore>, index: KeyIndex) -> Self {
        Self { store, index }
    }

    /// Return the cached result for `service`/`suffix`, or run `verb` against
    /// `source` and cache what it returns.
    ///
    /// The key is registered in the index even when caching is disabled.
    pub async fn cache_or_fetch<'a, D>(
        &'a self,
        service: &'a str,
        suffix: Option<&'a str>,
        source: &'a D,
        verb: &'a str,
        policy: &CachePolicy,
    ) -> Result<CacheValue>
    where
        D: DataSource + ?Sized,
    {
        self.cache_or_else(service, suffix, policy, move || async move {
            let verb = Verb::parse(verb);
            source.execute(&verb.operation, &verb.arguments).await
        })
        .await
    }

    /// Same as [`cache_or_fetch`](Self::cache_or_fetch) with an arbitrary
    /// fetch closure. `fetch` runs at most once, and never on a hit.
    pub async fn cache_or_else<'a, F, Fut>(
        &'a self,
        service: &'a str,
        suffix: Option<&'a str>,
        policy: &CachePolicy,
        fetch: F,
    ) -> Result<CacheValue>
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<CacheValue>> + Send + 'a,
    {
        let key = self.index.index_key(service, suffix.unwrap_or_default()).await?;

        let logging = policy.logging_enabled;
        let refresh_key = key.clone();
        let fetch_data: Compute<'a> = Box::pin(async move {
            if logging {
                info!("Refreshing cache for {} ({})", service, refresh_key);
            }
            fetch().await
        });

        if !policy.caching_enabled {
            return fetch_data.await;
        }

        match policy.ttl() {
            Some(ttl) => self.store.remember(&key, ttl, fetch_data).await,
            None => self.store.remember_forever(&key, fetch_data).await,
        }
    }
}
