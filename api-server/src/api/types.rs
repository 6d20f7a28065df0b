use async_graphql::SimpleObject;
use listings_client::{Listing, ListingsError, ListingsPage, Pagination};

/// `{success, listings, pagination, error}` envelope for searches
#[derive(SimpleObject, Debug, Default)]
pub struct ListingsResult {
    pub success: bool,
    pub listings: Vec<Listing>,
    pub pagination: Option<Pagination>,
    pub error: Option<String>,
}

impl From<Result<ListingsPage, ListingsError>> for ListingsResult {
    fn from(result: Result<ListingsPage, ListingsError>) -> Self {
        match result {
            Ok(page) => Self {
                success: true,
                listings: page.listings,
                pagination: page.pagination,
                error: None,
            },
            Err(err) => Self {
                error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }
}

/// `{success, listing, error}` envelope for a single listing
#[derive(SimpleObject, Debug, Default)]
pub struct ListingResult {
    pub success: bool,
    pub listing: Option<Listing>,
    pub error: Option<String>,
}

impl From<Result<Listing, ListingsError>> for ListingResult {
    fn from(result: Result<Listing, ListingsError>) -> Self {
        match result {
            Ok(listing) => Self {
                success: true,
                listing: Some(listing),
                error: None,
            },
            Err(err) => Self {
                error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }
}
