//! Decoding raw intents into typed, validated actions.
//!
//! String action names and free-form data maps come out of the parser; what
//! goes into the dispatcher is a domain-tagged enum with a statically-known
//! payload per variant. Coercion is permissive where the model is sloppy in
//! harmless ways (numeric strings, missing optional fields) and strict where
//! guessing would mutate the wrong thing (missing required fields).

use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::parser::{CHAT_ACTION, Intent, NAVIGATE_ACTION};
use crate::error::AssistantError;
use crate::modules::{finance, habits, inventory, notes, study, tasks};

/// A fully decoded, dispatchable action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Plain conversational reply; the host shows `response_text` and
    /// nothing is dispatched.
    Chat,
    /// Navigation request; the host owns routing.
    Navigate { target: String },
    Finance(finance::FinanceAction),
    Tasks(tasks::TaskAction),
    Notes(notes::NoteAction),
    Habits(habits::HabitAction),
    Study(study::StudyAction),
    Inventory(inventory::InventoryAction),
}

/// Result of decoding one intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Action(Action),
    /// The action name is owned by no module. Logged, never fatal.
    Dropped { action: String },
}

/// Decodes an intent into a typed action.
///
/// Unknown action names are dropped (the model invents verbs sometimes);
/// known action names with malformed payloads are validation errors so the
/// host can tell the user instead of silently doing the wrong thing.
pub fn decode(intent: &Intent) -> Result<Decoded, AssistantError> {
    let action = intent.action.as_str();
    let data = &intent.data;

    if action == CHAT_ACTION {
        return Ok(Decoded::Action(Action::Chat));
    }
    if action == NAVIGATE_ACTION {
        let target = string_or(data, "page", "home");
        return Ok(Decoded::Action(Action::Navigate { target }));
    }

    if let Some(decoded) = finance::decode(action, data) {
        return Ok(Decoded::Action(Action::Finance(decoded?)));
    }
    if let Some(decoded) = tasks::decode(action, data) {
        return Ok(Decoded::Action(Action::Tasks(decoded?)));
    }
    if let Some(decoded) = notes::decode(action, data) {
        return Ok(Decoded::Action(Action::Notes(decoded?)));
    }
    if let Some(decoded) = habits::decode(action, data) {
        return Ok(Decoded::Action(Action::Habits(decoded?)));
    }
    if let Some(decoded) = study::decode(action, data) {
        return Ok(Decoded::Action(Action::Study(decoded?)));
    }
    if let Some(decoded) = inventory::decode(action, data) {
        return Ok(Decoded::Action(Action::Inventory(decoded?)));
    }

    warn!(action, "dropping unrecognized action");
    Ok(Decoded::Dropped {
        action: action.to_string(),
    })
}

// -- Field coercion helpers shared by every domain decoder --

pub(crate) fn require_string(
    action: &str,
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<String, AssistantError> {
    optional_string(data, field).ok_or_else(|| AssistantError::Validation {
        action: action.to_string(),
        field,
        reason: "is required".to_string(),
    })
}

pub(crate) fn optional_string(data: &Map<String, Value>, field: &str) -> Option<String> {
    match data.get(field) {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        // Models sometimes emit bare numbers where we expect names.
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn string_or(data: &Map<String, Value>, field: &str, default: &str) -> String {
    optional_string(data, field).unwrap_or_else(|| default.to_string())
}

pub(crate) fn require_amount(
    action: &str,
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, AssistantError> {
    match optional_amount(action, data, field)? {
        Some(amount) => Ok(amount),
        None => Err(AssistantError::Validation {
            action: action.to_string(),
            field,
            reason: "is required".to_string(),
        }),
    }
}

/// Accepts numbers and numeric strings; rejects everything else.
pub(crate) fn optional_amount(
    action: &str,
    data: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, AssistantError> {
    let invalid = |reason: &str| AssistantError::Validation {
        action: action.to_string(),
        field,
        reason: reason.to_string(),
    };
    let amount = match data.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| invalid("is not a representable number"))?,
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("must be a number"))?,
        Some(_) => return Err(invalid("must be a number")),
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid("must be a non-negative number"));
    }
    Ok(Some(amount))
}

/// Parses an ISO date; anything else (including absence) means today.
pub(crate) fn date_or_today(data: &Map<String, Value>, field: &str) -> NaiveDate {
    optional_string(data, field)
        .and_then(|text| NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) fn bool_or(data: &Map<String, Value>, field: &str, default: bool) -> bool {
    match data.get(field) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" => true,
            "false" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

pub(crate) fn quantity_or(data: &Map<String, Value>, field: &str, default: u32) -> u32 {
    match data.get(field) {
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|quantity| u32::try_from(quantity).ok())
            .unwrap_or(default),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn intent(action: &str, payload: Value) -> Intent {
        Intent {
            action: action.to_string(),
            data: data(payload),
            response_text: String::new(),
        }
    }

    #[test]
    fn test_chat_and_navigate_decode_as_control() {
        let decoded = decode(&intent("CHAT", json!({}))).unwrap();
        assert_eq!(decoded, Decoded::Action(Action::Chat));

        let decoded = decode(&intent("NAVIGATE", json!({"page": "finance"}))).unwrap();
        assert_eq!(
            decoded,
            Decoded::Action(Action::Navigate {
                target: "finance".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_action_is_dropped_not_fatal() {
        let decoded = decode(&intent("MAKE_COFFEE", json!({}))).unwrap();
        assert_eq!(
            decoded,
            Decoded::Dropped {
                action: "MAKE_COFFEE".to_string()
            }
        );
    }

    #[test]
    fn test_numeric_string_amount_coerces() {
        let payload = data(json!({"amount": "200.5"}));
        assert_eq!(
            require_amount("ADD_EXPENSE", &payload, "amount").unwrap(),
            200.5
        );
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let payload = data(json!({"amount": -5}));
        assert!(require_amount("ADD_EXPENSE", &payload, "amount").is_err());
    }

    #[test]
    fn test_missing_required_field_is_validation_error() {
        let error = decode(&intent("ADD_EXPENSE", json!({"name": "coffee"}))).unwrap_err();
        match error {
            AssistantError::Validation { action, field, .. } => {
                assert_eq!(action, "ADD_EXPENSE");
                assert_eq!(field, "amount");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_date_defaults_to_today() {
        let today = Local::now().date_naive();
        assert_eq!(date_or_today(&data(json!({})), "date"), today);
        assert_eq!(date_or_today(&data(json!({"date": "not a date"})), "date"), today);
        assert_eq!(
            date_or_today(&data(json!({"date": "2026-02-01"})), "date"),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_quantity_coercions() {
        assert_eq!(quantity_or(&data(json!({"quantity": 3})), "quantity", 1), 3);
        assert_eq!(quantity_or(&data(json!({"quantity": "7"})), "quantity", 1), 7);
        assert_eq!(quantity_or(&data(json!({})), "quantity", 1), 1);
    }
}
