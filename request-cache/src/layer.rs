use crate::cache::{CacheConfig, CacheStats, TtlCache};
use crate::clock::{SharedClock, SystemClock};
use crate::deduplication::{DeduplicationConfig, DeduplicationError, RequestDeduplicator};
use chrono::Duration;
use std::future::Future;
use std::sync::Arc;

/// TTL cache plus in-flight request tracking, keyed by request signature.
///
/// Meant to be built once by the application and shared through
/// [`SharedRequestCache`].
pub struct RequestCache<V, E> {
    cache: TtlCache<V>,
    deduplicator: RequestDeduplicator<V, E>,
}

impl<V, E> RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(cache_config: CacheConfig, deduplication_config: DeduplicationConfig) -> Self {
        Self::with_clock(cache_config, deduplication_config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cache_config: CacheConfig,
        deduplication_config: DeduplicationConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            cache: TtlCache::with_clock(cache_config, Arc::clone(&clock)),
            deduplicator: RequestDeduplicator::with_clock(deduplication_config, clock),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.cache.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.cache.has(key)
    }

    pub fn set(&self, key: impl Into<String>, data: V, ttl: Duration) {
        self.cache.set(key, data, ttl)
    }

    pub fn set_default(&self, key: impl Into<String>, data: V) {
        self.cache.set_default(key, data)
    }

    /// See [`RequestDeduplicator::deduplicate`]
    pub async fn deduplicate<F, Fut>(&self, key: &str, request_fn: F) -> Result<V, DeduplicationError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.deduplicator.deduplicate(key, request_fn).await
    }

    /// Cache-first fetch. Misses go through [`Self::deduplicate`] and
    /// successful results are stored for `ttl`. Errors are never cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        request_fn: F,
    ) -> Result<V, DeduplicationError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached);
        }

        let data = self.deduplicator.deduplicate(key, request_fn).await?;
        self.cache.set(key, data.clone(), ttl);
        Ok(data)
    }

    /// Drop cached entries and in-flight requests whose key starts with
    /// `prefix`, or everything. Returns the number of cached entries removed.
    pub fn clear(&self, prefix: Option<&str>) -> usize {
        self.deduplicator.clear(prefix);
        self.cache.clear(prefix)
    }

    pub fn evict_expired(&self) -> usize {
        self.cache.evict_expired()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.deduplicator.is_pending(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            pending_requests: self.deduplicator.stats().pending_requests,
            ..self.cache.stats()
        }
    }
}

impl<V, E> Default for RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CacheConfig::default(), DeduplicationConfig::default())
    }
}

/// Thread-safe wrapper for the request cache
pub type SharedRequestCache<V, E> = Arc<RequestCache<V, E>>;
