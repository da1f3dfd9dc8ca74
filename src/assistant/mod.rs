//! The orchestration core: one user message in, one turn report out.
//!
//! Flow: assemble the system prompt, forward the trailing history window and
//! the new message to the completion service, parse whatever comes back into
//! intents, then decode and dispatch each intent strictly in order. Later
//! intents may depend on entities created by earlier ones, so the loop is
//! sequential by contract, not by accident.

pub mod action;
pub mod dispatch;
pub mod json;
pub mod parser;
pub mod prompt;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use tracing::warn;

use crate::agents::{CompletionClient, CompletionOptions, ConversationMessage};
use crate::assistant::action::{Action, Decoded};
use crate::assistant::parser::Intent;
use crate::error::AssistantError;
use crate::modules::{Capabilities, Outcome, Registry, SkipReason};
use crate::services::resolve::{Resolver, SubstringResolver};

/// Only the trailing window of history is forwarded per request; older
/// context is deliberately discarded to bound prompt size and cost.
pub const HISTORY_WINDOW: usize = 10;

/// Reply shown when the completion service itself was unreachable.
pub const COMPLETION_APOLOGY: &str =
    "Sorry, I couldn't reach my language service just now. Please try again in a moment.";

/// Cooperative cancellation for an in-flight turn.
///
/// The host cancels when the user navigates away or sends a newer message;
/// the turn then stops before any further writes, so a stale completion
/// can't mutate data the user no longer expects to change.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// What one turn did, item by item.
#[derive(Debug)]
pub struct TurnReport {
    /// The user-facing reply text (shared across a batch).
    pub reply: String,
    /// Set when the model asked for navigation; routing is the host's job.
    pub navigation: Option<String>,
    /// One entry per intent, in dispatch order.
    pub items: Vec<ActionReport>,
}

/// Outcome of a single dispatched intent.
#[derive(Debug)]
pub struct ActionReport {
    pub action: String,
    pub result: Result<Outcome, AssistantError>,
}

impl TurnReport {
    /// True when every item either applied or was a deliberate skip.
    pub fn is_clean(&self) -> bool {
        self.items.iter().all(|item| {
            matches!(
                item.result,
                Ok(Outcome::Applied) | Ok(Outcome::Skipped { .. })
            )
        })
    }
}

/// The assistant core. Owns the registry and the completion seam; owns no
/// data and caches no capabilities between calls.
pub struct Assistant {
    registry: Registry,
    client: Box<dyn CompletionClient>,
    resolver: Box<dyn Resolver>,
    options: CompletionOptions,
}

impl Assistant {
    pub fn new(registry: Registry, client: Box<dyn CompletionClient>) -> Self {
        Self {
            registry,
            client,
            resolver: Box::new(SubstringResolver),
            options: CompletionOptions::default(),
        }
    }

    /// Swaps the entity-resolution strategy (the default is first-wins
    /// substring matching).
    pub fn with_resolver(mut self, resolver: Box<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handles one user message end to end.
    ///
    /// Completion failures never escape: they degrade to an apologetic chat
    /// reply. Per-item failures (validation, hook errors, partial sagas) are
    /// captured in the report and do not abort the remaining items.
    pub fn handle_message(
        &self,
        text: &str,
        history: &[ConversationMessage],
        page_context: Option<&str>,
        capabilities: &mut Capabilities<'_>,
        cancel: &CancelToken,
    ) -> TurnReport {
        let system_prompt = format!(
            "{}\n\nCurrent date and time: {}",
            prompt::build_system_prompt(&self.registry, page_context),
            Local::now().format("%Y-%m-%d %H:%M")
        );

        let window_start = history.len().saturating_sub(HISTORY_WINDOW);
        let mut messages = Vec::with_capacity(history.len() - window_start + 2);
        messages.push(ConversationMessage::system(system_prompt));
        messages.extend(history[window_start..].iter().cloned());
        messages.push(ConversationMessage::user(text));

        let intents = match self.client.complete(&messages, &self.options) {
            Ok(raw) => parser::parse(&raw),
            Err(error) => {
                warn!(%error, "completion failed; degrading to chat");
                vec![Intent::fallback_chat(COMPLETION_APOLOGY)]
            }
        };

        self.run_batch(&intents, capabilities, cancel)
    }

    fn run_batch(
        &self,
        intents: &[Intent],
        capabilities: &mut Capabilities<'_>,
        cancel: &CancelToken,
    ) -> TurnReport {
        // The parser guarantees a non-empty batch sharing one reply.
        let reply = intents
            .first()
            .map(|intent| intent.response_text.clone())
            .unwrap_or_default();
        let mut navigation = None;
        let mut items = Vec::with_capacity(intents.len());

        for intent in intents {
            if cancel.is_cancelled() {
                items.push(ActionReport {
                    action: intent.action.clone(),
                    result: Ok(Outcome::Skipped {
                        reason: SkipReason::Cancelled,
                    }),
                });
                continue;
            }

            let result = match action::decode(intent) {
                Ok(Decoded::Action(action)) => {
                    if let Action::Navigate { target } = &action {
                        navigation = Some(target.clone());
                    }
                    dispatch::dispatch(&action, capabilities, self.resolver.as_ref())
                }
                Ok(Decoded::Dropped { .. }) => Ok(Outcome::Skipped {
                    reason: SkipReason::UnknownAction,
                }),
                Err(error) => Err(error),
            };
            items.push(ActionReport {
                action: intent.action.clone(),
                result,
            });
        }

        TurnReport {
            reply,
            navigation,
            items,
        }
    }
}
