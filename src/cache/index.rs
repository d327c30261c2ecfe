//! Per-service key index
//!
//! A single record in the store maps every service identifier to the key
//! suffixes it has cached. The record is a JSON object:
//!
//! ```json
//! { "Orders": ["active", "by-customer.42"], "Users": ["all"] }
//! ```
//!
//! Every mutation rewrites the whole record through
//! [`CacheStore::update_forever`], which is the only place the write race
//! between concurrent indexers can be closed.

use crate::cache::{
    store::CacheStore,
    types::{qualify, CacheKey, CacheValue},
};
use crate::error::{CacheError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Service identifier -> stored entry (normally an array of suffixes)
pub type GlobalIndex = serde_json::Map<String, Value>;

/// Compile a key pattern for full-match filtering
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}

/// Owner of the global key index record
#[derive(Clone)]
pub struct KeyIndex {
    store: Arc<dyn CacheStore>,
    record_key: String,
}

impl KeyIndex {
    /// Create an index stored under `record_key`
    pub fn new(store: Arc<dyn CacheStore>, record_key: impl Into<String>) -> Self {
        Self {
            store,
            record_key: record_key.into(),
        }
    }

    /// Store key holding the index record
    pub fn record_key(&self) -> &str {
        &self.record_key
    }

    /// Read the whole index; empty if it was never written
    pub async fn global_index(&self) -> Result<GlobalIndex> {
        decode_index(self.store.get(&self.record_key).await?)
    }

    /// Suffixes registered for `service`, optionally restricted to those
    /// fully matching `pattern`
    pub async fn service_keys(&self, service: &str, pattern: Option<&str>) -> Result<Vec<String>> {
        let matcher = pattern.map(compile_pattern).transpose()?;

        let index = self.global_index().await?;
        let keys = entry_keys(index.get(service));

        Ok(match matcher {
            Some(regex) => keys.into_iter().filter(|key| regex.is_match(key)).collect(),
            None => keys,
        })
    }

    /// Replace the suffix list of `service`
    pub async fn set_service_keys(&self, service: &str, keys: Vec<String>) -> Result<()> {
        let service = service.to_string();
        let keys = dedupe(keys);

        debug!("Setting {} index keys for {}", keys.len(), service);

        self.store
            .update_forever(
                &self.record_key,
                Box::new(move |current: Option<CacheValue>| -> Result<CacheValue> {
                    let mut index = decode_index(current)?;
                    index.insert(service, to_array(keys));
                    Ok(Value::Object(index))
                }),
            )
            .await?;
        Ok(())
    }

    /// Register `suffix` for `service` and return the fully-qualified key
    pub async fn index_key(&self, service: &str, suffix: &str) -> Result<CacheKey> {
        self.add_service_keys(service, &[suffix.to_string()]).await?;

        debug!("Indexed key {} for {}", suffix, service);
        Ok(qualify(service, suffix))
    }

    /// Append `added` suffixes to the entry of `service`, skipping duplicates
    pub async fn add_service_keys(&self, service: &str, added: &[String]) -> Result<()> {
        if added.is_empty() {
            return Ok(());
        }

        let owner = service.to_string();
        let added = added.to_vec();

        self.store
            .update_forever(
                &self.record_key,
                Box::new(move |current: Option<CacheValue>| -> Result<CacheValue> {
                    let mut index = decode_index(current)?;
                    let mut keys = entry_keys(index.get(&owner));
                    keys.extend(added);
                    index.insert(owner, to_array(dedupe(keys)));
                    Ok(Value::Object(index))
                }),
            )
            .await?;
        Ok(())
    }

    /// Drop `removed` suffixes from the entry of `service`
    pub async fn remove_service_keys(&self, service: &str, removed: &[String]) -> Result<()> {
        if removed.is_empty() {
            return Ok(());
        }

        let owner = service.to_string();
        let removed: HashSet<String> = removed.iter().cloned().collect();

        self.store
            .update_forever(
                &self.record_key,
                Box::new(move |current: Option<CacheValue>| -> Result<CacheValue> {
                    let mut index = decode_index(current)?;
                    let kept: Vec<String> = entry_keys(index.get(&owner))
                        .into_iter()
                        .filter(|key| !removed.contains(key))
                        .collect();
                    index.insert(owner, to_array(kept));
                    Ok(Value::Object(index))
                }),
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIndex")
            .field("record_key", &self.record_key)
            .finish()
    }
}

fn decode_index(value: Option<CacheValue>) -> Result<GlobalIndex> {
    match value {
        None | Some(Value::Null) => Ok(GlobalIndex::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(CacheError::CorruptIndex(format!(
            "expected an object, found {}",
            other
        ))),
    }
}

/// Normalise a stored entry into a list of suffixes
fn entry_keys(entry: Option<&Value>) -> Vec<String> {
    match entry {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
        Some(Value::Object(map)) => {
            // Array-like objects ({"0": .., "1": ..}) keep their numeric order
            let mut items: Vec<(&String, &Value)> = map.iter().collect();
            items.sort_by_key(|(position, _)| {
                let position = position.parse::<u64>().ok();
                (position.is_none(), position)
            });
            items.into_iter().map(|(_, value)| scalar_text(value)).collect()
        }
        Some(scalar) => vec![scalar_text(scalar)],
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn dedupe(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}

fn to_array(keys: Vec<String>) -> Value {
    Value::Array(keys.into_iter().map(Value::String).collect())
}
