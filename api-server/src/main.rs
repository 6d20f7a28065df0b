mod api;
mod error;
mod models;

use api::ApiSchema;
use async_graphql::http::GraphiQLSource;
use async_graphql_rocket::{GraphQLQuery, GraphQLRequest, GraphQLResponse};
use error::Error;
use log::{info, LevelFilter};
use models::config::Config;
use models::context::Context;
use rocket::response::content::RawHtml;
use rocket::State;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[rocket::get("/")]
fn graphiql() -> RawHtml<String> {
    RawHtml(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[rocket::get("/graphql?<query..>")]
async fn graphql_query(schema: &State<ApiSchema>, query: GraphQLQuery) -> GraphQLResponse {
    query.execute(schema.inner()).await
}

#[rocket::post("/graphql", data = "<request>", format = "application/json")]
async fn graphql_request(schema: &State<ApiSchema>, request: GraphQLRequest) -> GraphQLResponse {
    request.execute(schema.inner()).await
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    TermLogger::init(
        LevelFilter::Info,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config_path =
        std::env::var("LOCKSMITH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    info!("Loading configuration from {}", config_path);
    let config = Config::load(&config_path)?;

    let context = Arc::new(Context::new(config)?);
    let schema = api::build_schema(context);

    rocket::build()
        .manage(schema)
        .mount("/", rocket::routes![graphiql, graphql_query, graphql_request])
        .launch()
        .await?;

    Ok(())
}
