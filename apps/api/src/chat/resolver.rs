//! Query resolution — the tiered fallback pipeline behind every chat answer.
//!
//! Flow: personal history → common questions → generative completion, first
//! conclusive answer wins; a generated answer is then augmented with a
//! catalog search when the extraction call finds a book subject.
//!
//! Tiers are strictly sequential: each is a cheaper substitute for the next,
//! no tier is re-entered, and no earlier result is revisited once a later
//! tier runs.

use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogResult, CatalogSearch};
use crate::chat::completion::CompletionService;
use crate::chat::extraction::EntityExtractor;
use crate::chat::session::ConversationSession;
use crate::errors::AppError;
use crate::history::store::AnswerStore;

/// Which tier produced the final answer. Determines whether the UI offers
/// to persist it (cached tiers are already stored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    History,
    Common,
    Generated,
}

/// The one displayable result of a resolved question.
///
/// `catalog_results` is `Some(vec![])` when a search ran and found nothing
/// (the UI renders a distinct no-results message for that) and `None` when
/// no search ran at all.
#[derive(Debug, Serialize)]
pub struct ResolvedAnswer {
    pub answer: String,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_results: Option<Vec<CatalogResult>>,
}

/// The ordered fallback chain. Kept as an explicit list so the sequence is
/// auditable and each stage is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    PersonalHistory,
    CommonQuestions,
    Generate,
}

const TIERS: [Tier; 3] = [
    Tier::PersonalHistory,
    Tier::CommonQuestions,
    Tier::Generate,
];

pub struct QueryResolver {
    store: Arc<dyn AnswerStore>,
    completion: CompletionService,
    extractor: EntityExtractor,
    catalog: Arc<dyn CatalogSearch>,
}

impl QueryResolver {
    pub fn new(
        store: Arc<dyn AnswerStore>,
        completion: CompletionService,
        extractor: EntityExtractor,
        catalog: Arc<dyn CatalogSearch>,
    ) -> Self {
        Self {
            store,
            completion,
            extractor,
            catalog,
        }
    }

    /// Resolves one question into one displayable answer.
    pub async fn resolve(
        &self,
        question: &str,
        user_id: Option<Uuid>,
        session: &mut ConversationSession,
    ) -> Result<ResolvedAnswer, AppError> {
        for tier in TIERS {
            let Some((answer, provenance)) =
                self.run_tier(tier, question, user_id, session).await?
            else {
                continue;
            };

            // Extraction runs on the original question after every generated
            // answer, book-related or not; cached answers skip augmentation.
            let catalog_results = if provenance == Provenance::Generated {
                self.augment(question).await?
            } else {
                None
            };

            return Ok(ResolvedAnswer {
                answer,
                provenance,
                catalog_results,
            });
        }

        // Generate always concludes, so the loop cannot fall through.
        Err(AppError::Internal(anyhow!(
            "resolver exhausted all tiers without an answer"
        )))
    }

    /// Runs one tier. `None` means a miss: fall through to the next tier.
    async fn run_tier(
        &self,
        tier: Tier,
        question: &str,
        user_id: Option<Uuid>,
        session: &mut ConversationSession,
    ) -> Result<Option<(String, Provenance)>, AppError> {
        match tier {
            Tier::PersonalHistory => {
                let hit = match self.store.lookup_personal(question, user_id).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        // degraded lookup is a miss, not a failure
                        warn!("personal history lookup degraded: {e}");
                        None
                    }
                };
                Ok(hit.map(|answer| (answer, Provenance::History)))
            }
            Tier::CommonQuestions => {
                let hit = match self.store.lookup_common(question).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        warn!("common question lookup degraded: {e}");
                        None
                    }
                };
                Ok(hit.map(|answer| (answer, Provenance::Common)))
            }
            Tier::Generate => {
                let answer = self
                    .completion
                    .answer(session, question)
                    .await
                    .map_err(|e| AppError::Llm(e.to_string()))?;
                Ok(Some((answer, Provenance::Generated)))
            }
        }
    }

    /// Extraction plus conditional catalog search. An empty keyword skips
    /// the catalog call entirely.
    async fn augment(&self, question: &str) -> Result<Option<Vec<CatalogResult>>, AppError> {
        let keyword = self
            .extractor
            .extract_book_subject(question)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        if keyword.is_empty() {
            return Ok(None);
        }

        let results = self
            .catalog
            .search(&keyword)
            .await
            .map_err(|e| AppError::Catalog(e.to_string()))?;

        info!(
            "catalog search for '{keyword}' returned {} result(s)",
            results.len()
        );

        Ok(Some(results))
    }
}
