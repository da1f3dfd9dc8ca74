use thiserror::Error;

/// Errors the assistant core can surface to the host.
///
/// Parse failures never appear here: malformed model output degrades to a
/// fallback chat intent inside the parser. Everything else is typed so the
/// host can decide what to show the user.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The completion request never produced an HTTP response.
    #[error("completion transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The completion service answered with a non-success status.
    #[error("completion service returned {status}: {detail}")]
    Completion { status: u16, detail: String },

    /// The completion response had no usable assistant content.
    #[error("completion response missing content")]
    EmptyCompletion,

    /// A recognized action arrived with a payload we refuse to guess at.
    #[error("invalid payload for {action}: field '{field}' {reason}")]
    Validation {
        action: String,
        field: &'static str,
        reason: String,
    },

    /// A capability mutation rejected the call.
    #[error("capability call '{call}' failed: {detail}")]
    Hook { call: &'static str, detail: String },

    /// A compound operation applied its first step but not its second.
    /// No rollback is attempted; the host should warn the user.
    #[error("{saga}: step '{failed}' failed after '{completed}' was applied: {detail}")]
    SagaPartial {
        saga: &'static str,
        completed: &'static str,
        failed: &'static str,
        detail: String,
    },
}

impl AssistantError {
    /// Wraps a capability error, keeping the call site name.
    pub(crate) fn hook(call: &'static str, error: color_eyre::Report) -> Self {
        Self::Hook {
            call,
            detail: error.to_string(),
        }
    }
}
