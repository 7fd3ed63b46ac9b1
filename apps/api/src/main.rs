mod catalog;
mod chat;
mod config;
mod db;
mod errors;
mod help;
mod history;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::{CatalogSearch, ObaCatalogClient};
use crate::chat::completion::CompletionService;
use crate::chat::extraction::EntityExtractor;
use crate::chat::resolver::QueryResolver;
use crate::chat::session::SessionStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::history::store::{AnswerStore, PgAnswerStore};
use crate::llm_client::{CompletionProvider, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting OBI chat API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize the completion client shared by the chat and extraction calls
    let llm: Arc<dyn CompletionProvider> = Arc::new(LlmClient::new(config.openai_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize the catalog search client
    let catalog: Arc<dyn CatalogSearch> = Arc::new(ObaCatalogClient::new(
        config.catalog_base_url.clone(),
        config.catalog_public_key.clone(),
        config.catalog_secret_key.clone(),
    ));
    info!("Catalog client initialized ({})", config.catalog_base_url);

    // Assemble the query-resolution pipeline
    let store: Arc<dyn AnswerStore> = Arc::new(PgAnswerStore::new(db.clone()));
    let resolver = Arc::new(QueryResolver::new(
        store.clone(),
        CompletionService::new(llm.clone()),
        EntityExtractor::new(llm),
        catalog.clone(),
    ));
    let sessions = Arc::new(SessionStore::new());

    // Build app state
    let state = AppState {
        db,
        store,
        resolver,
        sessions,
        catalog,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
