//! Answer store: exact-match lookups against the two persisted question
//! tables, plus the save path for confirmed answers.
//!
//! Lookups are read-only and case-sensitive, with no fuzzy matching. The save
//! path truncates both texts and rejects a duplicate question per user as a
//! terminal condition (callers surface it, nobody retries it).

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::history::HistoryEntryRow;

/// Persisted question/answer texts are capped at this many characters.
pub const MAX_TEXT_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an entry with this question already exists for this user")]
    DuplicateQuestion,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// The persistence seam of the resolution pipeline. Production uses
/// `PgAnswerStore`; resolver tests inject in-memory fakes.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Exact-match lookup in the user's saved history. An anonymous caller
    /// (`user_id` = None) always misses without touching storage.
    async fn lookup_personal(
        &self,
        question: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<String>, StoreError>;

    /// Exact-match lookup in the seeded common-question set.
    async fn lookup_common(&self, question: &str) -> Result<Option<String>, StoreError>;

    /// Inserts a confirmed question/answer pair for the user. Fails with
    /// `DuplicateQuestion` when the same question text is already saved.
    async fn save(
        &self,
        question: &str,
        answer: &str,
        user_id: Uuid,
    ) -> Result<HistoryEntryRow, StoreError>;
}

pub struct PgAnswerStore {
    pool: PgPool,
}

impl PgAnswerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerStore for PgAnswerStore {
    async fn lookup_personal(
        &self,
        question: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<String>, StoreError> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let answer: Option<String> = sqlx::query_scalar(
            "SELECT answer FROM user_questions WHERE question = $1 AND user_id = $2 LIMIT 1",
        )
        .bind(question)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn lookup_common(&self, question: &str) -> Result<Option<String>, StoreError> {
        let answer: Option<String> =
            sqlx::query_scalar("SELECT answer FROM common_questions WHERE question = $1 LIMIT 1")
                .bind(question)
                .fetch_optional(&self.pool)
                .await?;

        Ok(answer)
    }

    async fn save(
        &self,
        question: &str,
        answer: &str,
        user_id: Uuid,
    ) -> Result<HistoryEntryRow, StoreError> {
        let question = truncate_chars(question, MAX_TEXT_CHARS);
        let answer = truncate_chars(answer, MAX_TEXT_CHARS);

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_questions WHERE question = $1 AND user_id = $2)",
        )
        .bind(question)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Err(StoreError::DuplicateQuestion);
        }

        let row: HistoryEntryRow = sqlx::query_as(
            r#"
            INSERT INTO user_questions (id, user_id, question, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, question, answer, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // the unique index closes the check-then-insert race
            if is_unique_violation(&e) {
                StoreError::DuplicateQuestion
            } else {
                StoreError::Storage(e)
            }
        })?;

        Ok(row)
    }
}

/// Truncates to at most `max` characters, respecting UTF-8 boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[test]
    fn test_truncate_chars_short_text_untouched() {
        assert_eq!(truncate_chars("korte vraag", MAX_TEXT_CHARS), "korte vraag");
    }

    #[test]
    fn test_truncate_chars_caps_at_limit() {
        let long = "a".repeat(1500);
        assert_eq!(truncate_chars(&long, MAX_TEXT_CHARS).len(), 1000);
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        // ë is two bytes; a byte cap would split it
        let text = "ë".repeat(1200);
        let truncated = truncate_chars(&text, MAX_TEXT_CHARS);
        assert_eq!(truncated.chars().count(), 1000);
        assert_eq!(truncated.len(), 2000);
    }

    /// In-memory implementation of the `AnswerStore` contract, used to pin
    /// down the behavior every backend must have.
    struct MemoryStore {
        personal: Mutex<HashMap<(Uuid, String), String>>,
        common: HashMap<String, String>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                personal: Mutex::new(HashMap::new()),
                common: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl AnswerStore for MemoryStore {
        async fn lookup_personal(
            &self,
            question: &str,
            user_id: Option<Uuid>,
        ) -> Result<Option<String>, StoreError> {
            let Some(user_id) = user_id else {
                return Ok(None);
            };
            let personal = self.personal.lock().unwrap();
            Ok(personal.get(&(user_id, question.to_string())).cloned())
        }

        async fn lookup_common(&self, question: &str) -> Result<Option<String>, StoreError> {
            Ok(self.common.get(question).cloned())
        }

        async fn save(
            &self,
            question: &str,
            answer: &str,
            user_id: Uuid,
        ) -> Result<HistoryEntryRow, StoreError> {
            let question = truncate_chars(question, MAX_TEXT_CHARS).to_string();
            let answer = truncate_chars(answer, MAX_TEXT_CHARS).to_string();
            let mut personal = self.personal.lock().unwrap();
            if personal.contains_key(&(user_id, question.clone())) {
                return Err(StoreError::DuplicateQuestion);
            }
            personal.insert((user_id, question.clone()), answer.clone());
            Ok(HistoryEntryRow {
                id: Uuid::new_v4(),
                user_id,
                question,
                answer,
                created_at: chrono::Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_save_then_lookup_round_trips() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        store
            .save("Hoe lang mag ik een boek lenen?", "Drie weken.", user)
            .await
            .unwrap();

        let answer = store
            .lookup_personal("Hoe lang mag ik een boek lenen?", Some(user))
            .await
            .unwrap();
        assert_eq!(answer.as_deref(), Some("Drie weken."));
    }

    #[tokio::test]
    async fn test_second_save_of_same_question_is_rejected() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        store.save("Dubbele vraag?", "Eerste.", user).await.unwrap();
        let second = store.save("Dubbele vraag?", "Tweede.", user).await;

        assert!(matches!(second, Err(StoreError::DuplicateQuestion)));
        // the stored answer is the original, not overwritten
        let answer = store
            .lookup_personal("Dubbele vraag?", Some(user))
            .await
            .unwrap();
        assert_eq!(answer.as_deref(), Some("Eerste."));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_user_and_exact() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.save("Vraag", "Antwoord", user).await.unwrap();

        // other user misses
        let other = store
            .lookup_personal("Vraag", Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(other.is_none());

        // case-sensitive exact match only
        let cased = store.lookup_personal("vraag", Some(user)).await.unwrap();
        assert!(cased.is_none());

        // anonymous caller always misses
        let anonymous = store.lookup_personal("Vraag", None).await.unwrap();
        assert!(anonymous.is_none());
    }
}
