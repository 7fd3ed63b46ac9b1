use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One saved question/answer pair in a user's history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}
