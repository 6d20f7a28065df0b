pub mod mutation;
pub mod query;
pub mod types;


use crate::models::context::ContextPointer;
use async_graphql::{Context, EmptySubscription, Schema};
use mutation::Mutation;
use query::Query;

pub type ApiSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(context: ContextPointer) -> ApiSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(context)
        .finish()
}

pub fn get_context<'ctx>(context: &Context<'ctx>) -> &'ctx ContextPointer {
    context.data_unchecked::<ContextPointer>()
}
