//! Fail-soft parsing of raw completion text into structured intents.
//!
//! The upstream model is probabilistic: it may answer with perfect JSON,
//! JSON wrapped in prose, truncated JSON, or no JSON at all. Whatever
//! arrives, `parse` returns a non-empty intent list and never panics or
//! errors past this boundary, because a broken model response must not crash the
//! conversation.

use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::json::extract_json_object;

/// Action name for plain conversational replies. Owned by the host UI, not
/// by any domain module.
pub const CHAT_ACTION: &str = "CHAT";

/// Action name for navigation requests. Owned by the host UI.
pub const NAVIGATE_ACTION: &str = "NAVIGATE";

/// Reply used when the model supplied an action but no response text.
pub const DEFAULT_REPLY: &str = "Done!";

/// Reply used when the model output could not be understood at all.
pub const PARSE_APOLOGY: &str =
    "Sorry, I couldn't quite work out what to do there. Could you rephrase?";

/// One structured action derived from free-form user text.
///
/// `action` is either a registered domain action name or one of the two
/// control actions (`CHAT`, `NAVIGATE`). `data` carries free-form parameters
/// whose required keys depend on the action; the decoder validates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub data: Map<String, Value>,
    pub response_text: String,
}

impl Intent {
    /// The synthetic intent every failure path degrades to.
    pub fn fallback_chat(response_text: impl Into<String>) -> Self {
        Self {
            action: CHAT_ACTION.to_string(),
            data: Map::new(),
            response_text: response_text.into(),
        }
    }
}

/// Parses raw completion text into one-or-more intents.
///
/// Two shapes are recognized: a single-intent object
/// `{action, data, response_text}` and a batch object
/// `{actions: [{action, data}, ...], response_text}` whose shared
/// `response_text` is attached to every produced intent. Missing fields get
/// defensive defaults rather than rejections.
pub fn parse(raw: &str) -> Vec<Intent> {
    let Some(json) = extract_json_object(raw) else {
        warn!("completion response contained no JSON object");
        return vec![Intent::fallback_chat(PARSE_APOLOGY)];
    };

    let object = match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(object)) => object,
        Ok(_) | Err(_) => {
            warn!("completion response was not a parseable JSON object");
            return vec![Intent::fallback_chat(PARSE_APOLOGY)];
        }
    };

    let response_text = object
        .get("response_text")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_REPLY)
        .to_string();

    if let Some(actions) = object.get("actions").and_then(Value::as_array) {
        let intents: Vec<Intent> = actions
            .iter()
            .filter_map(Value::as_object)
            .map(|item| Intent {
                action: action_of(item),
                data: data_of(item),
                response_text: response_text.clone(),
            })
            .collect();
        if intents.is_empty() {
            // A batch wrapper with nothing usable inside still carries the
            // reply text.
            return vec![Intent::fallback_chat(response_text)];
        }
        return intents;
    }

    vec![Intent {
        action: action_of(&object),
        data: data_of(&object),
        response_text,
    }]
}

fn action_of(object: &Map<String, Value>) -> String {
    object
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .unwrap_or(CHAT_ACTION)
        .to_string()
}

fn data_of(object: &Map<String, Value>) -> Map<String, Value> {
    match object.get("data") {
        Some(Value::Object(data)) => data.clone(),
        _ => Map::new(),
    }
}
