use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::help::HelpQuestionRow;
use crate::state::AppState;

/// GET /api/v1/help-questions
///
/// Seeded example questions for the chat screen's quick buttons.
pub async fn handle_list_help_questions(
    State(state): State<AppState>,
) -> Result<Json<Vec<HelpQuestionRow>>, AppError> {
    let questions: Vec<HelpQuestionRow> =
        sqlx::query_as("SELECT id, question, answer FROM help_questions ORDER BY question")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(questions))
}
