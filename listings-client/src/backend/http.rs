use super::ListingsBackend;
use crate::listing::{ListingEnvelope, ListingsEnvelope};
use crate::{Listing, ListingFilters, ListingsError, ListingsPage};
use ::utils::surf_logging::SurfLogging;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use surf::http::headers::AUTHORIZATION;
use surf::{Client, StatusCode};

/// Talks to the listings REST endpoints with bearer token auth
#[derive(Clone)]
pub struct HttpListingsBackend {
    http: Client,
    api_base: String,
    token: String,
}

impl HttpListingsBackend {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn listings_url(&self, filters: &ListingFilters) -> String {
        let query = filters.to_query_string();
        if query.is_empty() {
            format!("{}/listings", self.api_base)
        } else {
            format!("{}/listings?{}", self.api_base, query)
        }
    }

    pub fn listing_url(&self, id: &str) -> String {
        format!("{}/listings/{}", self.api_base, id)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(StatusCode, Option<T>), ListingsError> {
        let mut res = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .await?;

        let status = res.status();
        match res.body_json::<T>().await {
            Ok(body) => Ok((status, Some(body))),
            Err(err) if status.is_success() => Err(ListingsError::Decode(err.to_string())),
            // Error pages are not always JSON
            Err(_) => Ok((status, None)),
        }
    }
}

#[async_trait]
impl ListingsBackend for HttpListingsBackend {
    async fn fetch_listings(&self, filters: &ListingFilters) -> Result<ListingsPage, ListingsError> {
        const FALLBACK: &str = "Failed to fetch listings";

        let (status, body) = self.get_json::<ListingsEnvelope>(&self.listings_url(filters)).await?;
        match body {
            Some(body) if status.is_success() && body.success => Ok(ListingsPage {
                listings: body.listings,
                pagination: body.pagination,
            }),
            Some(body) => {
                log::warn!("Failed to fetch listings: {:?} (Status: {})", body.error, status);
                Err(ListingsError::backend(status.into(), body.error, FALLBACK))
            }
            None => Err(ListingsError::backend(status.into(), None, FALLBACK)),
        }
    }

    async fn fetch_listing(&self, id: &str) -> Result<Listing, ListingsError> {
        const FALLBACK: &str = "Failed to fetch listing";

        let (status, body) = self.get_json::<ListingEnvelope>(&self.listing_url(id)).await?;
        match body {
            Some(ListingEnvelope {
                success: true,
                listing: Some(listing),
                ..
            }) if status.is_success() => Ok(listing),
            Some(body) => Err(ListingsError::backend(status.into(), body.error, FALLBACK)),
            None => Err(ListingsError::backend(status.into(), None, FALLBACK)),
        }
    }
}
