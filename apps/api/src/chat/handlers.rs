use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::catalog::CatalogResult;
use crate::chat::resolver::{Provenance, ResolvedAnswer};
use crate::errors::AppError;
use crate::state::AppState;

/// Shown when resolution fails outside the classified 429/503/500 paths.
/// The submit endpoint never returns an error body for a well-formed
/// question: whatever happens, the user gets exactly one bot message.
pub const FALLBACK_MESSAGE: &str =
    "Oops! OBI heeft technische problemen! Meld dit bij een medewerker.";

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub user_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub session_id: Uuid,
    pub answer: String,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_results: Option<Vec<CatalogResult>>,
}

/// POST /api/v1/chat/question
pub async fn handle_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }

    let (session_id, session) = state.sessions.open(req.session_id);
    let mut session = session.lock().await;

    let resolved = match state
        .resolver
        .resolve(question, req.user_id, &mut session)
        .await
    {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("query resolution failed: {e}");
            ResolvedAnswer {
                answer: FALLBACK_MESSAGE.to_string(),
                provenance: Provenance::Generated,
                catalog_results: None,
            }
        }
    };

    Ok(Json(QuestionResponse {
        session_id,
        answer: resolved.answer,
        provenance: resolved.provenance,
        catalog_results: resolved.catalog_results,
    }))
}

/// DELETE /api/v1/chat/session/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.end(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}
