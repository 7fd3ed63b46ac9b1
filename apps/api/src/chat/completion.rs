//! Stateful completion call: feed the running conversation to the model and
//! map upstream saturation/outage statuses to friendly display strings.
//!
//! Every classified failure still produces answer text. The chat must always
//! show something, so the error and success channels are unified here; only
//! statuses with no classification propagate as errors.

use std::sync::Arc;

use tracing::warn;

use crate::chat::session::ConversationSession;
use crate::llm_client::{CompletionError, CompletionOptions, CompletionProvider, Role};

/// Low temperature favors factual answers over creative ones.
const ANSWER_TEMPERATURE: f32 = 0.1;
const ANSWER_MAX_TOKENS: u32 = 500;

/// Shown when the upstream model is saturated (429/503). Worth retrying.
pub const SOFT_FAILURE_MESSAGE: &str =
    "OBI is even koffie halen, probeer deze vraag later opnieuw te stellen.";

/// Shown when the upstream model reports an internal failure (500).
pub const HARD_FAILURE_MESSAGE: &str =
    "OBI heeft momenteel technische problemen. Probeer later opnieuw.";

/// Maps an upstream status code to its fixed user-facing message.
/// Returns `None` for statuses this layer does not classify.
pub fn failure_message(status: u16) -> Option<&'static str> {
    match status {
        429 | 503 => Some(SOFT_FAILURE_MESSAGE),
        500 => Some(HARD_FAILURE_MESSAGE),
        _ => None,
    }
}

/// Wraps the completion provider with conversation bookkeeping.
pub struct CompletionService {
    provider: Arc<dyn CompletionProvider>,
}

impl CompletionService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Asks the model to answer `question` in the context of `session`.
    ///
    /// The user entry is appended before the call is issued. On success the
    /// assistant reply is appended too and returned. A classified upstream
    /// failure (429/503/500) returns its display message without touching
    /// the assistant side of the log; anything else propagates and leaves
    /// only the user entry behind.
    pub async fn answer(
        &self,
        session: &mut ConversationSession,
        question: &str,
    ) -> Result<String, CompletionError> {
        session.append(Role::User, question);

        let options = CompletionOptions {
            temperature: ANSWER_TEMPERATURE,
            max_tokens: Some(ANSWER_MAX_TOKENS),
        };

        match self.provider.complete(session.snapshot(), options).await {
            Ok(text) => {
                session.append(Role::Assistant, text.clone());
                Ok(text)
            }
            Err(CompletionError::Api { status, message }) => match failure_message(status) {
                Some(display) => {
                    warn!("completion API returned {status}, answering with notice: {message}");
                    Ok(display.to_string())
                }
                None => Err(CompletionError::Api { status, message }),
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ChatMessage;
    use async_trait::async_trait;

    /// Provider returning either a canned reply or a canned upstream status,
    /// recording what it was called with.
    struct CannedProvider {
        result: Result<String, u16>,
        seen: std::sync::Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            options: CompletionOptions,
        ) -> Result<String, CompletionError> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), options));
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::Api {
                    status: *status,
                    message: "upstream".to_string(),
                }),
            }
        }
    }

    fn provider(result: Result<&str, u16>) -> Arc<CannedProvider> {
        Arc::new(CannedProvider {
            result: result.map(str::to_string),
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn service(result: Result<&str, u16>) -> CompletionService {
        CompletionService::new(provider(result))
    }

    #[test]
    fn test_failure_message_classification() {
        assert_eq!(failure_message(429), Some(SOFT_FAILURE_MESSAGE));
        assert_eq!(failure_message(503), Some(SOFT_FAILURE_MESSAGE));
        assert_eq!(failure_message(500), Some(HARD_FAILURE_MESSAGE));
        assert_eq!(failure_message(400), None);
        assert_eq!(failure_message(404), None);
        assert_eq!(failure_message(502), None);
    }

    #[tokio::test]
    async fn test_success_appends_user_and_assistant() {
        let provider = provider(Ok("Hallo! Hoe kan ik je vandaag helpen."));
        let service = CompletionService::new(provider.clone());
        let mut session = ConversationSession::new();

        let answer = service.answer(&mut session, "Hallo").await.unwrap();

        assert_eq!(answer, "Hallo! Hoe kan ik je vandaag helpen.");
        let messages = session.snapshot();
        assert_eq!(messages.len(), 3); // persona + user + assistant
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Hallo! Hoe kan ik je vandaag helpen.");

        // one call, persona first, the new question last, bounded sampling
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (sent, options) = &seen[0];
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent.last().unwrap().content, "Hallo");
        assert_eq!(options.temperature, ANSWER_TEMPERATURE);
        assert_eq!(options.max_tokens, Some(ANSWER_MAX_TOKENS));
    }

    #[tokio::test]
    async fn test_saturated_upstream_yields_soft_notice() {
        let service = service(Err(503));
        let mut session = ConversationSession::new();

        let answer = service.answer(&mut session, "Hallo").await.unwrap();

        assert_eq!(answer, SOFT_FAILURE_MESSAGE);
        // user entry stays, nothing assistant-side was appended
        let messages = session.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_broken_upstream_yields_hard_notice() {
        let service = service(Err(500));
        let mut session = ConversationSession::new();

        let answer = service.answer(&mut session, "Hallo").await.unwrap();

        assert_eq!(answer, HARD_FAILURE_MESSAGE);
        assert_eq!(session.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_unclassified_status_propagates() {
        let service = service(Err(400));
        let mut session = ConversationSession::new();

        let result = service.answer(&mut session, "Hallo").await;

        assert!(matches!(
            result,
            Err(CompletionError::Api { status: 400, .. })
        ));
        // the user entry is left in place; the model never contradicted it
        assert_eq!(session.snapshot().len(), 2);
    }
}
