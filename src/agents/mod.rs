//! Conversation types and the completion-client seam.
//!
//! The core talks to exactly one external text-completion service. The
//! trait exists so the provider can be swapped and so tests can stub the
//! network entirely.

pub mod openai_compat;

use crate::error::AssistantError;

/// A message in the conversation forwarded to the completion service.
#[derive(Debug, Clone)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Tunables for a completion request.
///
/// Low temperature favors deterministic routing over creative variation;
/// the token cap bounds cost and latency. Batch replies with many actions
/// must fit the cap, so hosts expecting large batches should raise it.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

/// A stateless call to a text-completion endpoint.
///
/// Implementations send `messages` verbatim (the system prompt is message
/// zero) and return the raw assistant text. No retry happens at this layer;
/// retry policy belongs to the caller.
pub trait CompletionClient {
    fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &CompletionOptions,
    ) -> Result<String, AssistantError>;
}
