pub mod backend;
pub mod cache_key;
mod error;
mod filters;
mod listing;


use backend::http::HttpListingsBackend;
use backend::ListingsBackend;
use cache_key::{listing_key, listings_key, CacheScope};
pub use cache_key::ListingsConfig;
pub use error::ListingsError;
pub use filters::ListingFilters;
pub use listing::{Listing, ListingsPage, ListingsPayload, Pagination, SellerProfile};
use request_cache::{CacheStats, RequestCache, SharedRequestCache};
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Cache shared by every listings caller in the process
pub type ListingsCache = RequestCache<ListingsPayload, ListingsError>;
pub type SharedListingsCache = SharedRequestCache<ListingsPayload, ListingsError>;

#[derive(Clone)]
pub struct ListingsClient {
    backend: Arc<dyn ListingsBackend>,
    cache: Option<SharedListingsCache>,
    config: ListingsConfig,
}

impl ListingsClient {
    /// Create a client without caching
    pub fn new(backend: Arc<dyn ListingsBackend>) -> Self {
        Self {
            backend,
            cache: None,
            config: ListingsConfig::default(),
        }
    }

    /// Create a client that reads through `cache`
    pub fn with_cache(
        backend: Arc<dyn ListingsBackend>,
        cache: SharedListingsCache,
        config: ListingsConfig,
    ) -> Self {
        Self {
            backend,
            cache: Some(cache),
            config,
        }
    }

    /// Client for the hosted REST API
    pub fn http(api_base: &str, token: &str, cache: SharedListingsCache, config: ListingsConfig) -> Self {
        Self::with_cache(Arc::new(HttpListingsBackend::new(api_base, token)), cache, config)
    }

    /// Search listings. Results are cached per query; searches are not
    /// deduplicated.
    pub async fn get_listings(&self, filters: &ListingFilters) -> Result<ListingsPage, ListingsError> {
        let Some(cache) = &self.cache else {
            return self.backend.fetch_listings(filters).await;
        };

        let cache_key = listings_key(filters);
        if let Some(ListingsPayload::Page(page)) = cache.get(&cache_key) {
            log::info!("Returning cached listings for: {}", cache_key);
            return Ok(page);
        }

        let page = self.backend.fetch_listings(filters).await?;

        let ttl = self.config.search_ttl(filters);
        cache.set(cache_key, ListingsPayload::Page(page.clone()), ttl);
        log::debug!("Listings response cached for {}s", ttl.num_seconds());

        Ok(page)
    }

    /// Fetch one listing. Concurrent requests for the same id share a single
    /// backend call.
    pub async fn get_listing(&self, id: &str) -> Result<Listing, ListingsError> {
        let Some(cache) = &self.cache else {
            return self.backend.fetch_listing(id).await;
        };

        let cache_key = listing_key(id);
        if let Some(ListingsPayload::Listing(listing)) = cache.get(&cache_key) {
            log::info!("Returning cached listing: {}", id);
            return Ok(*listing);
        }

        let backend = Arc::clone(&self.backend);
        let listing_id = id.to_string();
        let payload = cache
            .deduplicate(&cache_key, move || async move {
                backend
                    .fetch_listing(&listing_id)
                    .await
                    .map(|listing| ListingsPayload::Listing(Box::new(listing)))
            })
            .await?;

        cache.set(cache_key, payload.clone(), self.config.detail_ttl);
        match payload {
            ListingsPayload::Listing(listing) => Ok(*listing),
            ListingsPayload::Page(_) => Err(ListingsError::Decode(format!(
                "expected listing {} but the request produced a search page",
                id
            ))),
        }
    }

    /// Forget cached searches, e.g. after a listing was created
    pub fn invalidate_listings(&self) -> usize {
        self.clear_cache(Some(CacheScope::Listings.prefix()))
    }

    /// Forget a listing and all cached searches, e.g. after it was updated,
    /// deleted or archived
    pub fn invalidate_listing(&self, id: &str) -> usize {
        self.clear_cache(Some(&listing_key(id))) + self.invalidate_listings()
    }

    /// Forget everything cached by this client
    pub fn invalidate_all(&self) -> usize {
        CacheScope::iter()
            .map(|scope| self.clear_cache(Some(scope.prefix())))
            .sum()
    }

    /// Clear cache entries by key prefix, or all of them
    pub fn clear_cache(&self, prefix: Option<&str>) -> usize {
        self.cache
            .as_ref()
            .map(|cache| cache.clear(prefix))
            .unwrap_or(0)
    }

    /// Get cache statistics if caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Evict expired cache entries if caching is enabled
    pub fn evict_expired_cache(&self) -> usize {
        self.cache
            .as_ref()
            .map(|cache| cache.evict_expired())
            .unwrap_or(0)
    }
}
