//! Tasks module: add, complete, and delete tasks.
//!
//! Completing a finance-linked task (one carrying an expected cost) also
//! creates the matching finance entry, but that side effect lives inside the
//! host's `complete_task` capability; this executor only completes by id.

use chrono::NaiveDate;
use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{
    date_or_today, optional_amount, optional_string, require_string, string_or,
};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &["ADD_TASK", "COMPLETE_TASK", "DELETE_TASK"];

const PROMPT_FRAGMENT: &str = r#"
TASK RULES:
- ADD_TASK data: {"title": "...", "priority": "low|medium|high", "due_date": "YYYY-MM-DD", "context_type": "general|work|home|finance|...", "expected_cost": number, "finance_type": "income|expense"}
  Only title is needed. Priority defaults to medium, due_date to today, context_type to general.
  When the task is about money ("buy a monitor for 300"), set context_type to finance with expected_cost and finance_type so completing it books the entry automatically.
- COMPLETE_TASK data: {"title": "the task the user means"}
- DELETE_TASK data: {"title": "the task the user means"}
- Pass the user's own words as the title reference; matching is handled app-side.

Examples:
"remind me to call the dentist tomorrow" ->
{"action":"ADD_TASK","data":{"title":"Call the dentist","due_date":"2026-08-07"},"response_text":"Task added for tomorrow."}
"done with the tax report" ->
{"action":"COMPLETE_TASK","data":{"title":"tax report"},"response_text":"Nice, marked the tax report as done."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "TASKS",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    fn parse(value: Option<String>) -> Self {
        match value.as_deref().map(str::to_lowercase).as_deref() {
            Some("low") => Self::Low,
            Some("high") => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Parameters for a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub context_type: String,
    pub expected_cost: Option<f64>,
    pub finance_type: Option<String>,
}

/// Snapshot of a task, as loaded by the host.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// The tasks capability subset.
pub trait TaskHooks {
    fn tasks(&self) -> &[TaskSnapshot];
    fn add_task(&mut self, task: NewTask) -> Result<()>;
    /// Completion may carry domain side effects (finance-linked tasks book
    /// their entry); those belong to the host, not this executor.
    fn complete_task(&mut self, id: &str) -> Result<()>;
    fn delete_task(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    AddTask(NewTask),
    CompleteTask { title: String },
    DeleteTask { title: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<TaskAction, AssistantError>> {
    let decoded = match action {
        "ADD_TASK" => decode_add(action, data),
        "COMPLETE_TASK" => {
            require_string(action, data, "title").map(|title| TaskAction::CompleteTask { title })
        }
        "DELETE_TASK" => {
            require_string(action, data, "title").map(|title| TaskAction::DeleteTask { title })
        }
        _ => return None,
    };
    Some(decoded)
}

fn decode_add(action: &str, data: &Map<String, Value>) -> Result<TaskAction, AssistantError> {
    Ok(TaskAction::AddTask(NewTask {
        title: require_string(action, data, "title")?,
        priority: Priority::parse(optional_string(data, "priority")),
        due_date: date_or_today(data, "due_date"),
        context_type: string_or(data, "context_type", "general"),
        expected_cost: optional_amount(action, data, "expected_cost")?,
        finance_type: optional_string(data, "finance_type"),
    }))
}

pub(crate) fn execute(
    action: &TaskAction,
    hooks: &mut dyn TaskHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        TaskAction::AddTask(task) => {
            hooks
                .add_task(task.clone())
                .map_err(|error| AssistantError::hook("add_task", error))?;
            Ok(Outcome::Applied)
        }
        TaskAction::CompleteTask { title } => {
            let Some(task) = resolve_entity(resolver, title, hooks.tasks(), |t| &t.title) else {
                warn!(reference = %title, "no task matched; skipping complete");
                return Ok(Outcome::not_found(title.clone()));
            };
            let id = task.id.clone();
            hooks
                .complete_task(&id)
                .map_err(|error| AssistantError::hook("complete_task", error))?;
            Ok(Outcome::Applied)
        }
        TaskAction::DeleteTask { title } => {
            let Some(task) = resolve_entity(resolver, title, hooks.tasks(), |t| &t.title) else {
                warn!(reference = %title, "no task matched; skipping delete");
                return Ok(Outcome::not_found(title.clone()));
            };
            let id = task.id.clone();
            hooks
                .delete_task(&id)
                .map_err(|error| AssistantError::hook("delete_task", error))?;
            Ok(Outcome::Applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolve::SubstringResolver;
    use serde_json::json;

    #[derive(Default)]
    struct MemTasks {
        tasks: Vec<TaskSnapshot>,
        added: Vec<NewTask>,
        completed: Vec<String>,
    }

    impl TaskHooks for MemTasks {
        fn tasks(&self) -> &[TaskSnapshot] {
            &self.tasks
        }
        fn add_task(&mut self, task: NewTask) -> Result<()> {
            self.added.push(task);
            Ok(())
        }
        fn complete_task(&mut self, id: &str) -> Result<()> {
            self.completed.push(id.to_string());
            Ok(())
        }
        fn delete_task(&mut self, id: &str) -> Result<()> {
            self.tasks.retain(|t| t.id != id);
            Ok(())
        }
    }

    #[test]
    fn test_add_task_defaults() {
        let action = decode("ADD_TASK", json!({"title": "Buy milk"}).as_object().unwrap())
            .unwrap()
            .unwrap();
        match &action {
            TaskAction::AddTask(task) => {
                assert_eq!(task.priority, Priority::Medium);
                assert_eq!(task.context_type, "general");
                assert!(task.expected_cost.is_none());
            }
            other => panic!("unexpected action: {other:?}"),
        }
        let mut hooks = MemTasks::default();
        execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(hooks.added.len(), 1);
    }

    #[test]
    fn test_finance_linked_task_carries_cost() {
        let data = json!({
            "title": "Buy a monitor",
            "context_type": "finance",
            "expected_cost": "300",
            "finance_type": "expense"
        });
        let action = decode("ADD_TASK", data.as_object().unwrap()).unwrap().unwrap();
        match action {
            TaskAction::AddTask(task) => {
                assert_eq!(task.expected_cost, Some(300.0));
                assert_eq!(task.finance_type.as_deref(), Some("expense"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_complete_task_resolves_fuzzily() {
        let mut hooks = MemTasks {
            tasks: vec![TaskSnapshot {
                id: "t1".to_string(),
                title: "Finish the tax report".to_string(),
                completed: false,
            }],
            ..Default::default()
        };
        let action = TaskAction::CompleteTask {
            title: "tax report".to_string(),
        };
        let outcome = execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(hooks.completed, vec!["t1"]);
    }

    #[test]
    fn test_complete_unknown_task_is_noop() {
        let mut hooks = MemTasks::default();
        let action = TaskAction::CompleteTask {
            title: "nonexistent".to_string(),
        };
        let outcome = execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(outcome, Outcome::not_found("nonexistent"));
        assert!(hooks.completed.is_empty());
    }
}
