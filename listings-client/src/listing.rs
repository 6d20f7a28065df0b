use serde::{Deserialize, Serialize};

#[cfg(feature = "graphql")]
use async_graphql::SimpleObject;

/// Marketplace listing as returned by the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
#[serde(default)]
pub struct Listing {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub images: Vec<String>,
    pub vehicle_year: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub key_type: Option<String>,
    pub transponder_type: Option<String>,
    pub status: String,
    pub views: u64,
    pub created_at: String,
    pub updated_at: String,
    pub user_profiles: Option<SellerProfile>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
#[serde(default)]
pub struct SellerProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub rating: f64,
    pub total_reviews: u32,
    pub is_verified: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: Option<u64>,
    pub total_pages: u32,
    pub has_more: bool,
}

/// One page of search results
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
pub struct ListingsPage {
    pub listings: Vec<Listing>,
    pub pagination: Option<Pagination>,
}

/// Response body of `GET /listings`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListingsEnvelope {
    pub success: bool,
    pub listings: Vec<Listing>,
    pub pagination: Option<Pagination>,
    pub error: Option<String>,
}

/// Response body of `GET /listings/{id}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListingEnvelope {
    pub success: bool,
    pub listing: Option<Listing>,
    pub error: Option<String>,
}

/// Values stored in the shared listings cache
#[derive(Clone, Debug, PartialEq)]
pub enum ListingsPayload {
    Page(ListingsPage),
    Listing(Box<Listing>),
}
