//! Habits module: add, complete for a date, delete.

use chrono::NaiveDate;
use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{date_or_today, require_string};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &["ADD_HABIT", "COMPLETE_HABIT", "DELETE_HABIT"];

const PROMPT_FRAGMENT: &str = r#"
HABIT RULES:
- ADD_HABIT data: {"name": "..."}
- COMPLETE_HABIT data: {"name": "the habit the user means", "date": "YYYY-MM-DD"}
  Date defaults to today; set it when the user says "yesterday" or names a day.
- DELETE_HABIT data: {"name": "the habit the user means"}

Example:
"did my morning run yesterday too" ->
{"action":"COMPLETE_HABIT","data":{"name":"morning run","date":"2026-08-05"},"response_text":"Marked the morning run done for yesterday."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "HABITS",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

/// Snapshot of a habit, as loaded by the host.
#[derive(Debug, Clone)]
pub struct HabitSnapshot {
    pub id: String,
    pub name: String,
}

/// The habits capability subset.
pub trait HabitHooks {
    fn habits(&self) -> &[HabitSnapshot];
    fn add_habit(&mut self, name: &str) -> Result<()>;
    fn complete_habit(&mut self, id: &str, date: NaiveDate) -> Result<()>;
    fn delete_habit(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum HabitAction {
    AddHabit { name: String },
    CompleteHabit { name: String, date: NaiveDate },
    DeleteHabit { name: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<HabitAction, AssistantError>> {
    let decoded = match action {
        "ADD_HABIT" => require_string(action, data, "name").map(|name| HabitAction::AddHabit { name }),
        "COMPLETE_HABIT" => require_string(action, data, "name").map(|name| {
            HabitAction::CompleteHabit {
                name,
                date: date_or_today(data, "date"),
            }
        }),
        "DELETE_HABIT" => {
            require_string(action, data, "name").map(|name| HabitAction::DeleteHabit { name })
        }
        _ => return None,
    };
    Some(decoded)
}

pub(crate) fn execute(
    action: &HabitAction,
    hooks: &mut dyn HabitHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        HabitAction::AddHabit { name } => {
            hooks
                .add_habit(name)
                .map_err(|error| AssistantError::hook("add_habit", error))?;
            Ok(Outcome::Applied)
        }
        HabitAction::CompleteHabit { name, date } => {
            let Some(habit) = resolve_entity(resolver, name, hooks.habits(), |h| &h.name) else {
                warn!(reference = %name, "no habit matched; skipping complete");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = habit.id.clone();
            hooks
                .complete_habit(&id, *date)
                .map_err(|error| AssistantError::hook("complete_habit", error))?;
            Ok(Outcome::Applied)
        }
        HabitAction::DeleteHabit { name } => {
            let Some(habit) = resolve_entity(resolver, name, hooks.habits(), |h| &h.name) else {
                warn!(reference = %name, "no habit matched; skipping delete");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = habit.id.clone();
            hooks
                .delete_habit(&id)
                .map_err(|error| AssistantError::hook("delete_habit", error))?;
            Ok(Outcome::Applied)
        }
    }
}
