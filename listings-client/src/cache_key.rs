use crate::filters::ListingFilters;
use chrono::Duration;
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Key namespaces in the listings cache
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString)]
pub enum CacheScope {
    /// Search result pages
    #[strum(serialize = "listings:")]
    Listings,
    /// Single listing details
    #[strum(serialize = "listing:")]
    Listing,
}

impl CacheScope {
    pub fn prefix(&self) -> &str {
        self.as_ref()
    }
}

/// Cache key for a search, `listings:<query string>`
pub fn listings_key(filters: &ListingFilters) -> String {
    format!("{}{}", CacheScope::Listings.prefix(), filters.to_query_string())
}

/// Cache key for a single listing, `listing:<id>`
pub fn listing_key(id: &str) -> String {
    format!("{}{}", CacheScope::Listing.prefix(), id)
}

/// How long listing responses stay cached
#[derive(Clone, Debug)]
pub struct ListingsConfig {
    pub first_page_ttl: Duration,
    pub page_ttl: Duration,
    pub detail_ttl: Duration,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            first_page_ttl: Duration::seconds(60),
            page_ttl: Duration::seconds(30),
            detail_ttl: Duration::seconds(60),
        }
    }
}

impl ListingsConfig {
    /// First pages are requested most often and are kept longer
    pub fn search_ttl(&self, filters: &ListingFilters) -> Duration {
        if filters.is_first_page() {
            self.first_page_ttl
        } else {
            self.page_ttl
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_keys() {
        let filters = ListingFilters::new().with_category("keys").with_page(2, 20);
        assert_eq!(listings_key(&filters), "listings:category=keys&page=2&limit=20");
        assert_eq!(listings_key(&ListingFilters::new()), "listings:");
        assert_eq!(listing_key("abc-123"), "listing:abc-123");
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(CacheScope::from_str("listing:").unwrap(), CacheScope::Listing);
        assert!(CacheScope::from_str("messages:").is_err());
    }

    #[test]
    fn test_search_ttl() {
        let config = ListingsConfig::default();
        assert_eq!(config.search_ttl(&ListingFilters::new()), Duration::seconds(60));
        assert_eq!(
            config.search_ttl(&ListingFilters::new().with_page(2, 20)),
            Duration::seconds(30)
        );
    }
}
