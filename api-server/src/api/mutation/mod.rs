mod cache;

use async_graphql::MergedObject;
use cache::CacheMutation;

#[derive(MergedObject, Default)]
pub struct Mutation(CacheMutation);
