//! Study module: hierarchical subjects, chapters, parts, and presets.
//!
//! This is the deepest resolution chain in the system: a reference like
//! "waves in physics" walks Subject -> Chapter -> Part, narrowing each level
//! by the parent resolved before it. Presets are named templates attached to
//! a chapter, scoped either to one part or to every part via the
//! "all-parts" sentinel.

use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{optional_string, require_string};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &[
    "ADD_STUDY_SUBJECT",
    "ADD_STUDY_CHAPTER",
    "ADD_STUDY_PART",
    "COMPLETE_STUDY_PART",
    "APPLY_STUDY_PRESET",
    "DELETE_STUDY_SUBJECT",
];

/// Sentinel the model uses to scope a preset to every part of a chapter.
pub const ALL_PARTS: &str = "all-parts";

const PROMPT_FRAGMENT: &str = r#"
STUDY RULES:
- Study material is hierarchical: subjects contain chapters, chapters contain parts.
- ADD_STUDY_SUBJECT data: {"name": "..."}
- ADD_STUDY_CHAPTER data: {"subject_name": "...", "chapter_name": "..."}
- ADD_STUDY_PART data: {"subject_name": "...", "chapter_name": "...", "part_name": "..."} (subject_name optional when the chapter name is distinctive)
- COMPLETE_STUDY_PART data: {"chapter_name": "...", "part_name": "..."} (chapter_name optional)
- APPLY_STUDY_PRESET data: {"chapter_name": "...", "preset_name": "...", "part_name": "... or all-parts"}
  Omit part_name (or use "all-parts") to apply the preset to every part of the chapter.
- DELETE_STUDY_SUBJECT data: {"name": "..."}
- When one message creates a subject and then adds chapters to it, emit the subject action first in the batch.

Example:
"start tracking physics, first chapter is waves" ->
{"actions":[{"action":"ADD_STUDY_SUBJECT","data":{"name":"Physics"}},{"action":"ADD_STUDY_CHAPTER","data":{"subject_name":"Physics","chapter_name":"Waves"}}],"response_text":"Physics is set up with its first chapter, Waves."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "STUDY",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

/// Snapshot of a study subject.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

/// Snapshot of a chapter within a subject.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub id: String,
    pub subject_id: String,
    pub name: String,
}

/// Snapshot of a part within a chapter.
#[derive(Debug, Clone)]
pub struct Part {
    pub id: String,
    pub chapter_id: String,
    pub name: String,
}

/// Snapshot of a preset template. Presets that are children of another
/// preset carry a `parent_id` and are never matched directly.
#[derive(Debug, Clone)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

/// How a preset application is scoped within its chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetScope {
    AllParts,
    Part(String),
}

/// The study capability subset.
pub trait StudyHooks {
    fn subjects(&self) -> &[Subject];
    fn chapters(&self) -> &[Chapter];
    fn parts(&self) -> &[Part];
    fn presets(&self) -> &[Preset];
    fn add_subject(&mut self, name: &str) -> Result<()>;
    fn add_chapter(&mut self, subject_id: &str, name: &str) -> Result<()>;
    fn add_part(&mut self, chapter_id: &str, name: &str) -> Result<()>;
    fn complete_part(&mut self, id: &str) -> Result<()>;
    fn apply_preset(&mut self, preset_id: &str, chapter_id: &str, scope: PresetScope) -> Result<()>;
    fn delete_subject(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyAction {
    AddSubject { name: String },
    AddChapter { subject: String, chapter: String },
    AddPart {
        subject: Option<String>,
        chapter: String,
        part: String,
    },
    CompletePart {
        chapter: Option<String>,
        part: String,
    },
    ApplyPreset {
        chapter: String,
        preset: String,
        /// `None` means the `all-parts` sentinel: every part of the chapter.
        part: Option<String>,
    },
    DeleteSubject { name: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<StudyAction, AssistantError>> {
    let decoded = match action {
        "ADD_STUDY_SUBJECT" => {
            require_string(action, data, "name").map(|name| StudyAction::AddSubject { name })
        }
        "ADD_STUDY_CHAPTER" => decode_add_chapter(action, data),
        "ADD_STUDY_PART" => decode_add_part(action, data),
        "COMPLETE_STUDY_PART" => {
            require_string(action, data, "part_name").map(|part| StudyAction::CompletePart {
                chapter: optional_string(data, "chapter_name"),
                part,
            })
        }
        "APPLY_STUDY_PRESET" => decode_apply_preset(action, data),
        "DELETE_STUDY_SUBJECT" => {
            require_string(action, data, "name").map(|name| StudyAction::DeleteSubject { name })
        }
        _ => return None,
    };
    Some(decoded)
}

fn decode_add_chapter(
    action: &str,
    data: &Map<String, Value>,
) -> Result<StudyAction, AssistantError> {
    Ok(StudyAction::AddChapter {
        subject: require_string(action, data, "subject_name")?,
        chapter: require_string(action, data, "chapter_name")?,
    })
}

fn decode_add_part(action: &str, data: &Map<String, Value>) -> Result<StudyAction, AssistantError> {
    Ok(StudyAction::AddPart {
        subject: optional_string(data, "subject_name"),
        chapter: require_string(action, data, "chapter_name")?,
        part: require_string(action, data, "part_name")?,
    })
}

fn decode_apply_preset(
    action: &str,
    data: &Map<String, Value>,
) -> Result<StudyAction, AssistantError> {
    let part = optional_string(data, "part_name").filter(|name| name != ALL_PARTS);
    Ok(StudyAction::ApplyPreset {
        chapter: require_string(action, data, "chapter_name")?,
        preset: require_string(action, data, "preset_name")?,
        part,
    })
}

pub(crate) fn execute(
    action: &StudyAction,
    hooks: &mut dyn StudyHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        StudyAction::AddSubject { name } => {
            hooks
                .add_subject(name)
                .map_err(|error| AssistantError::hook("add_subject", error))?;
            Ok(Outcome::Applied)
        }
        StudyAction::AddChapter { subject, chapter } => {
            let Some(subject_id) = resolve_subject_id(hooks, resolver, subject) else {
                warn!(reference = %subject, "no subject matched; skipping chapter add");
                return Ok(Outcome::not_found(subject.clone()));
            };
            hooks
                .add_chapter(&subject_id, chapter)
                .map_err(|error| AssistantError::hook("add_chapter", error))?;
            Ok(Outcome::Applied)
        }
        StudyAction::AddPart { subject, chapter, part } => {
            let Some(chapter_id) = resolve_chapter_id(hooks, resolver, subject.as_deref(), chapter)
            else {
                warn!(reference = %chapter, "no chapter matched; skipping part add");
                return Ok(Outcome::not_found(chapter.clone()));
            };
            hooks
                .add_part(&chapter_id, part)
                .map_err(|error| AssistantError::hook("add_part", error))?;
            Ok(Outcome::Applied)
        }
        StudyAction::CompletePart { chapter, part } => {
            let Some(part_id) = resolve_part_id(hooks, resolver, chapter.as_deref(), part) else {
                warn!(reference = %part, "no part matched; skipping complete");
                return Ok(Outcome::not_found(part.clone()));
            };
            hooks
                .complete_part(&part_id)
                .map_err(|error| AssistantError::hook("complete_part", error))?;
            Ok(Outcome::Applied)
        }
        StudyAction::ApplyPreset { chapter, preset, part } => {
            apply_preset(hooks, resolver, chapter, preset, part.as_deref())
        }
        StudyAction::DeleteSubject { name } => {
            let Some(subject_id) = resolve_subject_id(hooks, resolver, name) else {
                warn!(reference = %name, "no subject matched; skipping delete");
                return Ok(Outcome::not_found(name.clone()));
            };
            hooks
                .delete_subject(&subject_id)
                .map_err(|error| AssistantError::hook("delete_subject", error))?;
            Ok(Outcome::Applied)
        }
    }
}

fn apply_preset(
    hooks: &mut dyn StudyHooks,
    resolver: &dyn Resolver,
    chapter: &str,
    preset: &str,
    part: Option<&str>,
) -> Result<Outcome, AssistantError> {
    let Some(chapter_id) = resolve_chapter_id(hooks, resolver, None, chapter) else {
        warn!(reference = %chapter, "no chapter matched; skipping preset");
        return Ok(Outcome::not_found(chapter.to_string()));
    };

    // Child presets only exist as pieces of their parent template; matching
    // considers top-level presets only.
    let top_level: Vec<&Preset> = hooks
        .presets()
        .iter()
        .filter(|candidate| candidate.parent_id.is_none())
        .collect();
    let Some(found) = resolve_entity(resolver, preset, &top_level, |p| &p.name) else {
        warn!(reference = %preset, "no preset matched; skipping apply");
        return Ok(Outcome::not_found(preset.to_string()));
    };
    let preset_id = found.id.clone();

    let scope = match part {
        None => PresetScope::AllParts,
        Some(part_name) => {
            let parts: Vec<&Part> = hooks
                .parts()
                .iter()
                .filter(|candidate| candidate.chapter_id == chapter_id)
                .collect();
            let Some(found) = resolve_entity(resolver, part_name, &parts, |p| &p.name) else {
                warn!(reference = %part_name, "no part matched; skipping preset");
                return Ok(Outcome::not_found(part_name.to_string()));
            };
            PresetScope::Part(found.id.clone())
        }
    };

    hooks
        .apply_preset(&preset_id, &chapter_id, scope)
        .map_err(|error| AssistantError::hook("apply_preset", error))?;
    Ok(Outcome::Applied)
}

fn resolve_subject_id(
    hooks: &dyn StudyHooks,
    resolver: &dyn Resolver,
    reference: &str,
) -> Option<String> {
    resolve_entity(resolver, reference, hooks.subjects(), |s| &s.name).map(|s| s.id.clone())
}

/// Resolves a chapter, narrowing to one subject's chapters when a subject
/// reference is given.
fn resolve_chapter_id(
    hooks: &dyn StudyHooks,
    resolver: &dyn Resolver,
    subject: Option<&str>,
    reference: &str,
) -> Option<String> {
    let subject_id = match subject {
        Some(subject_reference) => Some(resolve_subject_id(hooks, resolver, subject_reference)?),
        None => None,
    };
    let chapters: Vec<&Chapter> = hooks
        .chapters()
        .iter()
        .filter(|chapter| {
            subject_id
                .as_deref()
                .is_none_or(|id| chapter.subject_id == id)
        })
        .collect();
    resolve_entity(resolver, reference, &chapters, |c| &c.name).map(|c| c.id.clone())
}

fn resolve_part_id(
    hooks: &dyn StudyHooks,
    resolver: &dyn Resolver,
    chapter: Option<&str>,
    reference: &str,
) -> Option<String> {
    let chapter_id = match chapter {
        Some(chapter_reference) => Some(resolve_chapter_id(hooks, resolver, None, chapter_reference)?),
        None => None,
    };
    let parts: Vec<&Part> = hooks
        .parts()
        .iter()
        .filter(|part| chapter_id.as_deref().is_none_or(|id| part.chapter_id == id))
        .collect();
    resolve_entity(resolver, reference, &parts, |p| &p.name).map(|p| p.id.clone())
}
