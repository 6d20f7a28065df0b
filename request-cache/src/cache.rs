use crate::clock::{SharedClock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[cfg(feature = "graphql")]
use async_graphql::SimpleObject;

/// Configuration for the cache system
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// TTL used by `set_default`
    pub default_ttl: Duration,
    /// Maximum number of cached entries, unbounded when `None`
    pub max_entries: Option<usize>,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::seconds(60),
            max_entries: None,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn new(default_ttl: Duration, max_entries: Option<usize>) -> Self {
        Self {
            default_ttl,
            max_entries,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Cached value with its lifetime
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub data: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn new(data: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: now,
            // A TTL past the representable range never expires
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// An entry is valid strictly before its expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-memory TTL cache keyed by request signature.
///
/// Expired entries are dropped lazily when read. There is no background sweep;
/// call [`TtlCache::evict_expired`] to purge explicitly.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: SharedClock,
    pub config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            config,
        }
    }

    /// Get cached value if present and not expired
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now();
        // The map guard must be released before the stale entry can be removed
        let lookup = self
            .entries
            .get(key)
            .map(|entry| entry.is_valid_at(now).then(|| entry.data.clone()));

        match lookup {
            Some(Some(data)) => {
                log::debug!("Cache hit for key: {}", key);
                Some(data)
            }
            Some(None) => {
                log::debug!("Cache expired for key: {}", key);
                self.entries.remove_if(key, |_, entry| !entry.is_valid_at(now));
                None
            }
            None => {
                log::debug!("Cache miss for key: {}", key);
                None
            }
        }
    }

    /// Whether a live entry exists for `key`. Evicts it if stale.
    pub fn has(&self, key: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = self.clock.now();
        let valid = self.entries.get(key).map(|entry| entry.is_valid_at(now));
        match valid {
            Some(true) => true,
            Some(false) => {
                self.entries.remove_if(key, |_, entry| !entry.is_valid_at(now));
                false
            }
            None => false,
        }
    }

    /// Store `data` under `key` for `ttl`, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, data: V, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let key = key.into();
        if let Some(max_entries) = self.config.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max_entries {
                self.evict_expired();

                if self.entries.len() >= max_entries {
                    self.evict_oldest(max_entries);
                }
            }
        }

        let entry = CacheEntry::new(data, self.clock.now(), ttl);
        log::debug!("Stored in cache with key: {} (ttl {}s)", key, ttl.num_seconds());
        self.entries.insert(key, entry);
    }

    /// Store with the configured default TTL
    pub fn set_default(&self, key: impl Into<String>, data: V) {
        self.set(key, data, self.config.default_ttl);
    }

    /// Remove expired entries, returning how many were dropped
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid_at(now));
        let evicted = before.saturating_sub(self.entries.len());

        log::debug!("Evicted {} expired cache entries", evicted);
        evicted
    }

    /// Remove the oldest quarter of entries when at capacity
    fn evict_oldest(&self, max_entries: usize) {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().created_at))
            .collect();

        entries.sort_by_key(|(_, created_at)| *created_at);

        let to_remove = (max_entries / 4).max(1);
        for (key, _) in entries.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }

        log::debug!("Evicted {} oldest cache entries", to_remove);
    }

    /// Remove every entry whose key starts with `prefix`, or all entries.
    /// Returns the number of removed entries.
    pub fn clear(&self, prefix: Option<&str>) -> usize {
        let before = self.entries.len();
        match prefix {
            Some(prefix) => {
                self.entries.retain(|key, _| !key.starts_with(prefix));
                log::info!("Cache cleared for prefix: {}", prefix);
            }
            None => {
                self.entries.clear();
                log::info!("Cache cleared");
            }
        }
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let total_entries = self.entries.len();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_valid_at(now))
            .count();

        CacheStats {
            total_entries,
            valid_entries: total_entries.saturating_sub(expired_entries),
            expired_entries,
            pending_requests: 0,
            max_entries: self.config.max_entries,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub pending_requests: usize,
    pub max_entries: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::{json, Value};

    fn cache_with_clock(config: CacheConfig) -> (TtlCache<Value>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::with_clock(config, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_value_expires_after_ttl() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set("a", json!({"x": 1}), Duration::seconds(1));
        assert_eq!(cache.get("a"), Some(json!({"x": 1})));

        clock.advance(Duration::milliseconds(1100));
        assert_eq!(cache.get("a"), None);
        // Stale entry was evicted by the read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_is_invalid_at_exact_expiry() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set("a", json!(1), Duration::seconds(1));
        clock.advance(Duration::seconds(1));
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set("k", json!("old"), Duration::seconds(1));
        cache.set("k", json!("new"), Duration::seconds(10));
        clock.advance(Duration::seconds(5));

        assert_eq!(cache.get("k"), Some(json!("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_by_prefix() {
        let (cache, _clock) = cache_with_clock(CacheConfig::default());

        cache.set("listings:page=1", json!(1), Duration::seconds(60));
        cache.set("listings:page=2", json!(2), Duration::seconds(60));
        cache.set("listing:abc", json!(3), Duration::seconds(60));

        assert_eq!(cache.clear(Some("listings:")), 2);
        assert!(!cache.has("listings:page=1"));
        assert!(!cache.has("listings:page=2"));
        assert_eq!(cache.get("listing:abc"), Some(json!(3)));

        assert_eq!(cache.clear(None), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_default_ttl() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set_default("k", json!(true));
        clock.advance(Duration::seconds(59));
        assert!(cache.has("k"));
        clock.advance(Duration::seconds(1));
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let (cache, _clock) = cache_with_clock(CacheConfig::disabled());

        cache.set("k", json!(1), Duration::seconds(60));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired_and_stats() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set("short", json!(1), Duration::seconds(1));
        cache.set("long", json!(2), Duration::seconds(60));
        clock.advance(Duration::seconds(2));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.valid_entries, 1);

        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (cache, clock) = cache_with_clock(CacheConfig::new(Duration::seconds(60), Some(4)));

        for i in 0..4 {
            cache.set(format!("k{}", i), json!(i), Duration::seconds(60));
            clock.advance(Duration::seconds(1));
        }
        cache.set("k4", json!(4), Duration::seconds(60));

        assert_eq!(cache.len(), 4);
        assert!(!cache.has("k0"));
        assert!(cache.has("k4"));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let (cache, clock) = cache_with_clock(CacheConfig::default());

        cache.set("listings:x", json!(1), Duration::days(365 * 300_000));
        cache.set("listing:y", json!(2), Duration::MAX);
        clock.advance(Duration::days(365 * 100));

        assert_eq!(cache.get("listings:x"), Some(json!(1)));
        assert_eq!(cache.get("listing:y"), Some(json!(2)));
        assert_eq!(cache.stats().expired_entries, 0);
    }
}
