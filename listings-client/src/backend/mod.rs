pub mod http;

use crate::{Listing, ListingFilters, ListingsError, ListingsPage};
use async_trait::async_trait;

/// Source of listing data, usually the hosted REST API
#[async_trait]
pub trait ListingsBackend: Send + Sync {
    async fn fetch_listings(&self, filters: &ListingFilters) -> Result<ListingsPage, ListingsError>;

    async fn fetch_listing(&self, id: &str) -> Result<Listing, ListingsError>;
}
