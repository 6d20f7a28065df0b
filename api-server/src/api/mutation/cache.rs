use super::super::get_context;
use async_graphql::{Context, Object};
use log::info;

#[derive(Default)]
pub struct CacheMutation;

#[Object]
impl CacheMutation {
    /// Clear cached responses whose key starts with `prefix`, or all of them.
    /// Returns the number of removed entries.
    async fn clear_cache<'ctx>(&self, context: &Context<'ctx>, prefix: Option<String>) -> usize {
        let ctx = get_context(context);
        let removed = ctx.cache().clear(prefix.as_deref());
        info!("Cleared {} cached responses (prefix: {:?})", removed, prefix);
        removed
    }

    /// Drop a listing and every cached search after it changed
    async fn invalidate_listing<'ctx>(&self, context: &Context<'ctx>, id: String) -> usize {
        get_context(context).listings_client().invalidate_listing(&id)
    }

    /// Purge entries that are already past their TTL
    async fn evict_expired<'ctx>(&self, context: &Context<'ctx>) -> usize {
        get_context(context).listings_client().evict_expired_cache()
    }
}
