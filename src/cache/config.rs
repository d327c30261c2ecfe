//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key under which the global key index is stored by default
pub const DEFAULT_INDEX_KEY: &str = "cache-index";

/// Per-service caching policy
///
/// Owned by the service that uses it and read on every cache and flush call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// When false, every call goes straight to the data source
    pub caching_enabled: bool,

    /// Cache lifetime in minutes; zero or negative caches forever
    pub ttl_minutes: i64,

    /// Emit an info line on every refresh and flush
    pub logging_enabled: bool,

    /// Remove flushed suffixes from the key index
    pub prune_on_flush: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            ttl_minutes: 0,
            logging_enabled: true,
            prune_on_flush: true,
        }
    }
}

impl CachePolicy {
    /// Create a new builder for a cache policy
    pub fn builder() -> CachePolicyBuilder {
        CachePolicyBuilder::default()
    }

    /// True when entries never expire
    pub fn is_forever(&self) -> bool {
        self.ttl_minutes <= 0
    }

    /// Entry lifetime, or `None` when entries are kept forever
    pub fn ttl(&self) -> Option<Duration> {
        if self.is_forever() {
            None
        } else {
            let secs = (self.ttl_minutes as u64).saturating_mul(60);
            Some(Duration::from_secs(secs))
        }
    }

    /// Policy that bypasses the store entirely
    pub fn disabled() -> Self {
        Self {
            caching_enabled: false,
            ..Default::default()
        }
    }

    /// Policy with a fixed lifetime in minutes
    pub fn minutes(ttl_minutes: i64) -> Self {
        Self {
            ttl_minutes,
            ..Default::default()
        }
    }
}

/// Builder for cache policies
#[derive(Debug, Default)]
pub struct CachePolicyBuilder {
    caching_enabled: Option<bool>,
    ttl_minutes: Option<i64>,
    logging_enabled: Option<bool>,
    prune_on_flush: Option<bool>,
}

impl CachePolicyBuilder {
    /// Enable or disable caching
    pub fn caching_enabled(mut self, enable: bool) -> Self {
        self.caching_enabled = Some(enable);
        self
    }

    /// Set cache lifetime in minutes
    pub fn ttl_minutes(mut self, minutes: i64) -> Self {
        self.ttl_minutes = Some(minutes);
        self
    }

    /// Enable or disable refresh/flush logging
    pub fn logging_enabled(mut self, enable: bool) -> Self {
        self.logging_enabled = Some(enable);
        self
    }

    /// Enable or disable index pruning on flush
    pub fn prune_on_flush(mut self, enable: bool) -> Self {
        self.prune_on_flush = Some(enable);
        self
    }

    /// Build the cache policy
    pub fn build(self) -> CachePolicy {
        let defaults = CachePolicy::default();

        CachePolicy {
            caching_enabled: self.caching_enabled.unwrap_or(defaults.caching_enabled),
            ttl_minutes: self.ttl_minutes.unwrap_or(defaults.ttl_minutes),
            logging_enabled: self.logging_enabled.unwrap_or(defaults.logging_enabled),
            prune_on_flush: self.prune_on_flush.unwrap_or(defaults.prune_on_flush),
        }
    }
}

/// Process-level cache configuration: the index location plus the default
/// policy handed to services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store key holding the global key index
    pub index_key: String,

    /// Default policy for services built from this config
    pub policy: CachePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index_key: DEFAULT_INDEX_KEY.to_string(),
            policy: CachePolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from `QUERY_CACHE_*` environment variables
    ///
    /// Unset variables keep their defaults. Call `dotenv::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("QUERY_CACHE_INDEX_KEY") {
            config.index_key = key;
        }
        if let Some(raw) = lookup("QUERY_CACHE_ENABLED") {
            config.policy.caching_enabled = parse_flag("QUERY_CACHE_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("QUERY_CACHE_TTL_MINUTES") {
            config.policy.ttl_minutes = raw.trim().parse().map_err(|_| {
                CacheError::ConfigError(format!(
                    "QUERY_CACHE_TTL_MINUTES must be an integer, got '{}'",
                    raw
                ))
            })?;
        }
        if let Some(raw) = lookup("QUERY_CACHE_LOGGING") {
            config.policy.logging_enabled = parse_flag("QUERY_CACHE_LOGGING", &raw)?;
        }
        if let Some(raw) = lookup("QUERY_CACHE_PRUNE") {
            config.policy.prune_on_flush = parse_flag("QUERY_CACHE_PRUNE", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.index_key.trim().is_empty() {
            return Err(CacheError::ConfigError(
                "index_key must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CacheError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        assert!(policy.caching_enabled);
        assert!(policy.logging_enabled);
        assert!(policy.is_forever());
        assert_eq!(policy.ttl(), None);
    }

    #[test]
    fn test_policy_ttl() {
        assert_eq!(CachePolicy::minutes(10).ttl(), Some(Duration::from_secs(600)));
        assert!(CachePolicy::minutes(-5).is_forever());
        assert!(!CachePolicy::disabled().caching_enabled);
    }

    #[test]
    fn test_policy_ttl_saturates() {
        let ttl = CachePolicy::minutes(i64::MAX).ttl();
        assert_eq!(ttl, Some(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn test_policy_builder() {
        let policy = CachePolicy::builder()
            .ttl_minutes(15)
            .logging_enabled(false)
            .prune_on_flush(false)
            .build();

        assert!(policy.caching_enabled);
        assert_eq!(policy.ttl_minutes, 15);
        assert!(!policy.logging_enabled);
        assert!(!policy.prune_on_flush);
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = CacheConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.index_key, DEFAULT_INDEX_KEY);
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("QUERY_CACHE_INDEX_KEY", "orders-index"),
            ("QUERY_CACHE_ENABLED", "off"),
            ("QUERY_CACHE_TTL_MINUTES", " 30 "),
            ("QUERY_CACHE_LOGGING", "0"),
            ("QUERY_CACHE_PRUNE", "no"),
        ]))
        .unwrap();

        assert_eq!(config.index_key, "orders-index");
        assert!(!config.policy.caching_enabled);
        assert_eq!(config.policy.ttl_minutes, 30);
        assert!(!config.policy.logging_enabled);
        assert!(!config.policy.prune_on_flush);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = CacheConfig::from_lookup(lookup_from(&[("QUERY_CACHE_TTL_MINUTES", "soon")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::ConfigError(_)));

        let err = CacheConfig::from_lookup(lookup_from(&[("QUERY_CACHE_ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("QUERY_CACHE_ENABLED"));

        let err = CacheConfig::from_lookup(lookup_from(&[("QUERY_CACHE_INDEX_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::ConfigError(_)));
    }
}
