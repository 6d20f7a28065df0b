use getset::Getters;
use serde::{Deserialize, Serialize};
use utils::location::extract_zip_code;
use utils::query::QueryBuilder;

#[cfg(feature = "graphql")]
use async_graphql::InputObject;

/// Search filters for `GET /listings`. Unset and zero values are left out of
/// the query.
#[derive(Clone, Debug, Default, PartialEq, Getters, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(InputObject))]
#[getset(get = "pub")]
#[serde(default, rename_all = "camelCase")]
pub struct ListingFilters {
    category: Option<String>,
    condition: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    search: Option<String>,
    user_id: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    #[cfg_attr(feature = "graphql", graphql(default))]
    random: bool,
    zip_code: Option<String>,
    radius: Option<u32>,
}

impl ListingFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_price_range(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    /// Restrict to `radius` miles around the zip code found in `location`.
    /// Locations without a zip code leave the filter unset.
    pub fn near(mut self, location: &str, radius: u32) -> Self {
        self.zip_code = extract_zip_code(location).map(str::to_string);
        self.radius = self.zip_code.as_ref().map(|_| radius);
        self
    }

    /// Page unset or 1
    pub fn is_first_page(&self) -> bool {
        matches!(self.page, None | Some(0) | Some(1))
    }

    pub fn to_query_string(&self) -> String {
        QueryBuilder::new()
            .push_opt("category", non_empty(&self.category))
            .push_opt("condition", non_empty(&self.condition))
            .push_opt("minPrice", self.min_price.filter(|price| *price != 0.0))
            .push_opt("maxPrice", self.max_price.filter(|price| *price != 0.0))
            .push_opt("search", non_empty(&self.search))
            .push_opt("userId", non_empty(&self.user_id))
            .push_opt("page", self.page.filter(|page| *page != 0))
            .push_opt("limit", self.limit.filter(|limit| *limit != 0))
            .push_opt("random", self.random.then_some(true))
            .push_opt("zipCode", non_empty(&self.zip_code))
            .push_opt("radius", self.radius.filter(|radius| *radius != 0))
            .build()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
