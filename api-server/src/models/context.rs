use crate::models::config::Config;
use getset::Getters;
use listings_client::{ListingsCache, ListingsClient, SharedListingsCache};
use log::info;
use request_cache::DeduplicationConfig;
use std::sync::Arc;

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    listings_client: ListingsClient,
    cache: SharedListingsCache,
    config: Config,
}

impl Context {
    /// Build the process-wide cache and the REST-backed listings client
    pub fn new(config: Config) -> Result<Self, figment::Error> {
        let settings = config.cache();
        let listings_config = settings.listings_config()?;
        let cache = Arc::new(ListingsCache::new(
            settings.cache_config(),
            DeduplicationConfig {
                enabled: settings.enabled,
            },
        ));
        let listings_client = ListingsClient::http(
            config.api_base(),
            config.anon_key(),
            cache.clone(),
            listings_config,
        );

        info!(
            "Initialized ListingsClient with caching (enabled: {}, first page TTL: {}s, page TTL: {}s, detail TTL: {}s, max entries: {:?})",
            settings.enabled,
            settings.first_page_ttl_secs,
            settings.page_ttl_secs,
            settings.detail_ttl_secs,
            settings.max_entries,
        );

        Ok(Self::with_client(config, listings_client, cache))
    }

    pub fn with_client(config: Config, listings_client: ListingsClient, cache: SharedListingsCache) -> Self {
        Self {
            listings_client,
            cache,
            config,
        }
    }
}

pub type ContextPointer = Arc<Context>;
