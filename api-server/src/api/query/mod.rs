mod cache_stats;
mod listings;

use async_graphql::MergedObject;
use cache_stats::CacheStatsQuery;
use listings::ListingsQuery;

#[derive(MergedObject, Default)]
pub struct Query(ListingsQuery, CacheStatsQuery);
