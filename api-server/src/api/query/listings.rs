use super::super::get_context;
use crate::api::types::{ListingResult, ListingsResult};
use async_graphql::{Context, Object};
use listings_client::ListingFilters;
use log::error;

#[derive(Default)]
pub struct ListingsQuery;

#[Object]
impl ListingsQuery {
    /// Search marketplace listings
    async fn listings<'ctx>(
        &self,
        context: &Context<'ctx>,
        filters: Option<ListingFilters>,
    ) -> ListingsResult {
        let ctx = get_context(context);
        let filters = filters.unwrap_or_default();

        let result = ctx.listings_client().get_listings(&filters).await;
        if let Err(err) = &result {
            error!("Error fetching listings: {}", err);
        }
        result.into()
    }

    async fn listing<'ctx>(&self, context: &Context<'ctx>, id: String) -> ListingResult {
        let ctx = get_context(context);

        let result = ctx.listings_client().get_listing(&id).await;
        if let Err(err) = &result {
            error!("Error fetching listing {}: {}", id, err);
        }
        result.into()
    }
}
