use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A seeded example question shown as a quick button in the chat UI.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HelpQuestionRow {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
}
