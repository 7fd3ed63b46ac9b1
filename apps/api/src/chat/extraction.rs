//! Book-subject extraction: an independent model call that checks whether a
//! question concerns a book title or subject.
//!
//! Deliberately low-confidence: the model is asked to quote its finding and
//! the caller takes the first double-quoted substring. No quote means no
//! keyword, which is a normal outcome, not an error.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::chat::prompts::extraction_prompt;
use crate::llm_client::{
    ChatMessage, CompletionError, CompletionOptions, CompletionProvider, Role,
};

const EXTRACTION_TEMPERATURE: f32 = 0.1;

pub struct EntityExtractor {
    provider: Arc<dyn CompletionProvider>,
}

impl EntityExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Returns the book title/subject mentioned in `question`, or an empty
    /// string when the model quotes nothing.
    pub async fn extract_book_subject(&self, question: &str) -> Result<String, CompletionError> {
        let messages = [
            ChatMessage::new(Role::System, extraction_prompt(question)),
            ChatMessage::new(Role::User, question),
        ];

        let options = CompletionOptions {
            temperature: EXTRACTION_TEMPERATURE,
            max_tokens: None,
        };

        let reply = self.provider.complete(&messages, options).await?;

        Ok(first_quoted(&reply).unwrap_or_default().to_string())
    }
}

/// First double-quoted substring of `text`, if any.
fn first_quoted(text: &str) -> Option<&str> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    let re = QUOTED.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("valid quoted pattern"));
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedProvider {
        reply: String,
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: CompletionOptions,
        ) -> Result<String, CompletionError> {
            Ok(self.reply.clone())
        }
    }

    fn extractor(reply: &str) -> EntityExtractor {
        EntityExtractor::new(Arc::new(CannedProvider {
            reply: reply.to_string(),
        }))
    }

    #[test]
    fn test_first_quoted_takes_first_match() {
        assert_eq!(
            first_quoted(r#"The user asks about "Harry Potter" and "more""#),
            Some("Harry Potter")
        );
    }

    #[test]
    fn test_first_quoted_none_without_quotes() {
        assert_eq!(first_quoted("No book mentioned here."), None);
        assert_eq!(first_quoted(r#"Dangling quote: ""#), None);
    }

    #[tokio::test]
    async fn test_extracts_quoted_subject() {
        let extractor = extractor(r#"The user asks about "Harry Potter"."#);
        let keyword = extractor
            .extract_book_subject("Hebben jullie Harry Potter?")
            .await
            .unwrap();
        assert_eq!(keyword, "Harry Potter");
    }

    #[tokio::test]
    async fn test_unquoted_reply_yields_empty_keyword() {
        let extractor = extractor("The question is not about a book.");
        let keyword = extractor
            .extract_book_subject("Hoe laat gaan jullie open?")
            .await
            .unwrap();
        assert_eq!(keyword, "");
    }
}
