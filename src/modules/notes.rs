//! Notes module: the simplest executor shape. Direct add, fuzzy delete.

use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{require_string, string_or};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &["ADD_NOTE", "DELETE_NOTE"];

const PROMPT_FRAGMENT: &str = r#"
NOTE RULES:
- ADD_NOTE data: {"title": "...", "content": "..."}
  When the user dictates a note without a title, derive a short title from the first few words.
- DELETE_NOTE data: {"title": "the note the user means"}

Example:
"note that the wifi password is hunter2" ->
{"action":"ADD_NOTE","data":{"title":"Wifi password","content":"The wifi password is hunter2"},"response_text":"Saved that as a note."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "NOTES",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

/// Snapshot of a note, as loaded by the host.
#[derive(Debug, Clone)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: String,
}

/// The notes capability subset.
pub trait NoteHooks {
    fn notes(&self) -> &[NoteSnapshot];
    fn add_note(&mut self, title: &str, content: &str) -> Result<()>;
    fn delete_note(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteAction {
    AddNote { title: String, content: String },
    DeleteNote { title: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<NoteAction, AssistantError>> {
    let decoded = match action {
        "ADD_NOTE" => require_string(action, data, "title").map(|title| {
            let content = string_or(data, "content", &title);
            NoteAction::AddNote { title, content }
        }),
        "DELETE_NOTE" => {
            require_string(action, data, "title").map(|title| NoteAction::DeleteNote { title })
        }
        _ => return None,
    };
    Some(decoded)
}

pub(crate) fn execute(
    action: &NoteAction,
    hooks: &mut dyn NoteHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        NoteAction::AddNote { title, content } => {
            hooks
                .add_note(title, content)
                .map_err(|error| AssistantError::hook("add_note", error))?;
            Ok(Outcome::Applied)
        }
        NoteAction::DeleteNote { title } => {
            let Some(note) = resolve_entity(resolver, title, hooks.notes(), |n| &n.title) else {
                warn!(reference = %title, "no note matched; skipping delete");
                return Ok(Outcome::not_found(title.clone()));
            };
            let id = note.id.clone();
            hooks
                .delete_note(&id)
                .map_err(|error| AssistantError::hook("delete_note", error))?;
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
    struct MemNotes {
        notes: Vec<NoteSnapshot>,
        added: Vec<(String, String)>,
    }

    impl NoteHooks for MemNotes {
        fn notes(&self) -> &[NoteSnapshot] {
            &self.notes
        }
        fn add_note(&mut self, title: &str, content: &str) -> Result<()> {
            self.added.push((title.to_string(), content.to_string()));
            Ok(())
        }
        fn delete_note(&mut self, id: &str) -> Result<()> {
            self.notes.retain(|n| n.id != id);
            Ok(())
        }
    }

    #[test]
    fn test_add_note_content_defaults_to_title() {
        let action = decode("ADD_NOTE", json!({"title": "Wifi"}).as_object().unwrap())
            .unwrap()
            .unwrap();
        let mut hooks = MemNotes::default();
        execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(hooks.added[0], ("Wifi".to_string(), "Wifi".to_string()));
    }

    #[test]
    fn test_delete_note_fuzzy_match() {
        let mut hooks = MemNotes {
            notes: vec![NoteSnapshot {
                id: "n1".to_string(),
                title: "Meeting minutes March".to_string(),
            }],
            ..Default::default()
        };
        let action = NoteAction::DeleteNote {
            title: "meeting".to_string(),
        };
        assert_eq!(
            execute(&action, &mut hooks, &SubstringResolver).unwrap(),
            Outcome::Applied
        );
        assert!(hooks.notes.is_empty());
    }
}
