pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;
use crate::{catalog, chat, help, history};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat pipeline
        .route("/api/v1/chat/question", post(chat::handlers::handle_question))
        .route(
            "/api/v1/chat/session/:id",
            delete(chat::handlers::handle_end_session),
        )
        // Question history
        .route(
            "/api/v1/history",
            get(history::handlers::handle_list_history)
                .post(history::handlers::handle_save_history),
        )
        .route(
            "/api/v1/history/:id",
            delete(history::handlers::handle_delete_history),
        )
        // Help questions for the chat screen's quick buttons
        .route(
            "/api/v1/help-questions",
            get(help::handlers::handle_list_help_questions),
        )
        // Direct catalog search
        .route(
            "/api/v1/catalog/search",
            post(catalog::handlers::handle_search),
        )
        .with_state(state)
}
