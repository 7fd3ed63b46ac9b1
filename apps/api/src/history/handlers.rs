use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::store::StoreError;
use crate::models::history::HistoryEntryRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Serialize, FromRow)]
pub struct HistoryQuestion {
    pub id: Uuid,
    pub question: String,
}

/// GET /api/v1/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<HistoryQuestion>>, AppError> {
    let questions: Vec<HistoryQuestion> = sqlx::query_as(
        "SELECT id, question FROM user_questions WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(questions))
}

#[derive(Deserialize)]
pub struct SaveHistoryRequest {
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
}

/// POST /api/v1/history
///
/// Called after the user confirms saving an answered question. A repeat of
/// an already-saved question is a 409, not a silent overwrite.
pub async fn handle_save_history(
    State(state): State<AppState>,
    Json(req): Json<SaveHistoryRequest>,
) -> Result<(StatusCode, Json<HistoryEntryRow>), AppError> {
    let entry = state
        .store
        .save(&req.question, &req.answer, req.user_id)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateQuestion => AppError::Duplicate(e.to_string()),
            StoreError::Storage(e) => AppError::Database(e),
        })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/history/:id
pub async fn handle_delete_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM user_questions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("History entry {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
