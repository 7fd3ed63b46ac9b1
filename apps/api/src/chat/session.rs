//! Conversation state for one active chat.
//!
//! A session is an append-only, process-local message log seeded with the
//! persona prompt. It is never persisted: ending the session (or restarting
//! the process) discards it. Each session has a single logical owner; the
//! per-session mutex in `SessionStore` only serializes a client that fires
//! overlapping requests for the same conversation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::chat::prompts::PERSONA_PROMPT;
use crate::llm_client::{ChatMessage, Role};

/// Ordered message log for one conversation.
///
/// Invariants: the persona system message is always first and never
/// duplicated; entries are only ever appended.
#[derive(Debug)]
pub struct ConversationSession {
    messages: Vec<ChatMessage>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::System, PERSONA_PROMPT)],
        }
    }

    /// Appends one entry. Empty content is dropped silently; there is no
    /// other validation.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        let content = content.into();
        if content.is_empty() {
            return;
        }
        self.messages.push(ChatMessage { role, content });
    }

    /// The full ordered sequence, ready to hand to the completion provider.
    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of live sessions, keyed by conversation id.
///
/// Process-local by design: sessions do not survive a restart, and an
/// unknown id simply starts a fresh conversation under that id.
pub struct SessionStore {
    sessions: std::sync::Mutex<HashMap<Uuid, Arc<Mutex<ConversationSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, creating it if needed. `None` opens a
    /// brand-new conversation under a fresh id.
    pub fn open(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<ConversationSession>>) {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        let session = sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(ConversationSession::new())))
            .clone();
        (id, session)
    }

    /// Discards the session. Returns false if no such conversation is live.
    pub fn end(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        sessions.remove(id).is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
