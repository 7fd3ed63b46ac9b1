// Prompt constants for the chat pipeline. Each service keeps its sampling
// parameters next to its own code; only the prompt text lives here.

/// System persona prepended to every conversation. Always the first message
/// of a session and never repeated.
pub const PERSONA_PROMPT: &str =
    "Jij bent een chat bot genaamd OBI van de OBA (Openbare Bibliotheek Amsterdam).";

/// System instruction for the book-subject extraction call. The reply is
/// post-processed by taking the first double-quoted substring, so the model
/// is told to quote its finding.
pub fn extraction_prompt(question: &str) -> String {
    format!(
        "You are a helpful assistant. The user said: '{question}'. \
         Detect if the user asks something about a book title or a specific \
         subject for a book. If so, return only the book title or the subject, \
         wrapped in double quotes. If not, answer without using double quotes."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_question() {
        let prompt = extraction_prompt("Heb je Harry Potter?");
        assert!(prompt.contains("'Heb je Harry Potter?'"));
        assert!(prompt.contains("double quotes"));
    }
}
