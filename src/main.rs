use std::{env, fs::File, io::Write};

use async_graphql::{
    extensions::Logger, http::GraphiQLSource, EmptySubscription, SDLExportOptions, Schema,
};
use async_graphql_axum::GraphQL;
use axum::{
    response::{self, IntoResponse},
    routing::{get, post},
    Router,
};
use clap::Parser;
use simple_logger::SimpleLogger;

use log::info;
use mongodb::{options::ClientOptions, Client, Database};

use event::http_event_service::{
    list_topic_subscriptions, on_product_event, on_user_event, HttpEventServiceState,
};
use graphql::model::foreign_types::{Product, User};
use graphql::mutation::Mutation;
use graphql::query::Query;

mod event;
mod graphql;

/// Builds the GraphiQL frontend.
async fn graphiql() -> impl IntoResponse {
    response::Html(GraphiQLSource::build().endpoint("/").finish())
}

/// Establishes database connection and returns the client.
async fn db_connection() -> Client {
    let uri = match env::var_os("MONGODB_URI") {
        Some(uri) => uri.into_string().unwrap(),
        None => panic!("$MONGODB_URI is not set."),
    };

    // Parse a connection string into an options struct.
    let mut client_options = ClientOptions::parse(uri).await.unwrap();

    // Manually set an option.
    client_options.app_name = Some("CartCheckout".to_string());

    // Get a handle to the deployment.
    Client::with_options(client_options).unwrap()
}

/// Command line argument to toggle schema generation instead of service execution.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Generates GraphQL schema in `./schemas/cart.graphql`.
    #[arg(long)]
    generate_schema: bool,
}

/// Activates logger and parses argument for optional schema generation. Otherwise starts the service.
#[tokio::main]
async fn main() -> std::io::Result<()> {
    SimpleLogger::new().init().unwrap();

    let args = Args::parse();
    if args.generate_schema {
        let schema = Schema::build(Query, Mutation, EmptySubscription).finish();
        let mut file = File::create("./schemas/cart.graphql")?;
        let sdl_export_options = SDLExportOptions::new().federation();
        let schema_sdl = schema.sdl_with_options(sdl_export_options);
        file.write_all(schema_sdl.as_bytes())?;
        info!("GraphQL schema: ./schemas/cart.graphql was successfully generated!");
    } else {
        start_service().await;
    }
    Ok(())
}

/// Starts cart-checkout service on port 8080.
async fn start_service() {
    let client = db_connection().await;
    let db_client: Database = client.database("cart-checkout-database");

    let schema = Schema::build(Query, Mutation, EmptySubscription)
        .extension(Logger)
        .data(db_client.clone())
        .enable_federation()
        .finish();

    let event_service_state = HttpEventServiceState {
        product_collection: db_client.collection::<Product>("products"),
        user_collection: db_client.collection::<User>("users"),
    };

    let app = Router::new()
        .route("/dapr/subscribe", get(list_topic_subscriptions))
        .route("/on-product-event", post(on_product_event))
        .route("/on-user-event", post(on_user_event))
        .with_state(event_service_state)
        .route("/", get(graphiql).post_service(GraphQL::new(schema)));

    info!("GraphiQL IDE: http://0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
