use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::CatalogSearch;
use crate::chat::resolver::QueryResolver;
use crate::chat::session::SessionStore;
use crate::history::store::AnswerStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Persistence seam used by the resolver's lookup tiers and the save route.
    pub store: Arc<dyn AnswerStore>,
    /// The tiered query-resolution pipeline.
    pub resolver: Arc<QueryResolver>,
    /// Live conversations, process-local, discarded on session end.
    pub sessions: Arc<SessionStore>,
    /// Catalog backend, also exposed directly on the search route.
    pub catalog: Arc<dyn CatalogSearch>,
}
