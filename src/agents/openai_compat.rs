//! Wire types and the HTTP client for OpenAI-compatible chat completion APIs.
//!
//! The request always asks for JSON-formatted output: downstream parsing
//! expects an intent object, and the structured-output mode makes the model
//! far less likely to wrap it in prose.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::agents::{CompletionClient, CompletionOptions, ConversationMessage, MessageRole};
use crate::config::CompletionConfig;
use crate::error::AssistantError;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Content may be null in degenerate responses; treated as missing.
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn convert_messages(messages: &[ConversationMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            },
            content: msg.content.clone(),
        })
        .collect()
}

/// Stateless client for a single chat-completions endpoint.
///
/// Deliberately retry-free: a failed call surfaces immediately and the
/// orchestrator decides what the user sees.
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpCompletionClient {
    /// Builds the client, failing fast when no API key is configured rather
    /// than sending unauthenticated requests.
    pub fn new(config: &CompletionConfig) -> color_eyre::Result<Self> {
        let api_key = config.resolved_api_key();
        if api_key.trim().is_empty() {
            return Err(color_eyre::eyre::eyre!(
                "No completion API key configured. Set it in config.toml or the {} environment variable.",
                crate::config::API_KEY_ENV
            ));
        }
        Ok(Self {
            client: build_client()?,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(
        &self,
        messages: &[ConversationMessage],
        options: &CompletionOptions,
    ) -> Result<String, AssistantError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: convert_messages(messages),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(AssistantError::Completion {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: ChatResponse = response.json()?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AssistantError::EmptyCompletion)
    }
}

/// Standard timeouts for completion calls.
fn build_client() -> color_eyre::Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_messages_maps_roles() {
        let messages = vec![
            ConversationMessage::system("prompt"),
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("hello"),
        ];
        let wire = convert_messages(&messages);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "assistant");
        assert_eq!(wire[1].content, "hi");
    }

    #[test]
    fn test_request_serializes_json_mode() {
        let request = ChatRequest {
            model: "test-model".to_string(),
            messages: Vec::new(),
            temperature: 0.3,
            max_tokens: 512,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"response_format\":{\"type\":\"json_object\"}"));
        assert!(json.contains("\"max_tokens\":512"));
    }
}
