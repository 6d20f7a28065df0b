use super::super::get_context;
use async_graphql::{Context, Object, SimpleObject};
use request_cache::CacheStats;
use serde::Serialize;

#[derive(Default)]
pub struct CacheStatsQuery;

#[derive(SimpleObject, Serialize)]
pub struct CacheStatsResponse {
    pub cache_stats: CacheStats,
    pub cache_enabled: bool,
}

#[Object]
impl CacheStatsQuery {
    /// Get current cache statistics
    async fn cache_stats<'ctx>(&self, context: &Context<'ctx>) -> CacheStatsResponse {
        let ctx = get_context(context);

        CacheStatsResponse {
            cache_stats: ctx.cache().stats(),
            cache_enabled: ctx.config().cache().enabled,
        }
    }
}
