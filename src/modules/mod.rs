//! Domain modules: registry, capability interfaces, and executor outcomes.
//!
//! Each of the six domains declares the action names it owns, a prompt
//! fragment documenting them to the model, and an executor. The registry is
//! an explicit immutable value built once at startup and passed by
//! parameter, never read from hidden global state.

pub mod finance;
pub mod habits;
pub mod inventory;
pub mod notes;
pub mod study;
pub mod tasks;

use std::collections::HashSet;

use color_eyre::Result;

use crate::assistant::parser::{CHAT_ACTION, NAVIGATE_ACTION};

/// One domain's registration: its name as it appears in the system prompt,
/// the action names it owns, and its capability documentation.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub actions: &'static [&'static str],
    pub prompt_fragment: &'static str,
}

/// The immutable set of registered modules.
///
/// Action names must be pairwise disjoint across modules and must not shadow
/// the control actions; both are enforced here so routing ambiguity is a
/// startup failure instead of a silent first-match lottery.
pub struct Registry {
    modules: Vec<ModuleDescriptor>,
}

impl Registry {
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::new();
        for module in &modules {
            for action in module.actions {
                if *action == CHAT_ACTION || *action == NAVIGATE_ACTION {
                    return Err(color_eyre::eyre::eyre!(
                        "Module '{}' registers reserved control action '{}'",
                        module.name,
                        action
                    ));
                }
                if !seen.insert(action) {
                    return Err(color_eyre::eyre::eyre!(
                        "Action '{}' is registered by more than one module",
                        action
                    ));
                }
            }
        }
        Ok(Self { modules })
    }

    /// The standard six-domain registry.
    pub fn standard() -> Result<Self> {
        Self::new(vec![
            finance::descriptor(),
            tasks::descriptor(),
            notes::descriptor(),
            habits::descriptor(),
            study::descriptor(),
            inventory::descriptor(),
        ])
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    /// The module owning an action name, if any. Disjointness is validated
    /// at construction, so scan order cannot matter.
    pub fn owner_of(&self, action: &str) -> Option<&ModuleDescriptor> {
        self.modules
            .iter()
            .find(|module| module.actions.contains(&action))
    }
}

/// The capability subsets for one dispatch call, supplied fresh by the host.
///
/// Each field is that domain's narrow read/write interface into live data.
/// The dispatcher hands an executor only its own domain's field, so
/// cross-domain coupling cannot creep into an executor. Hosts typically keep
/// six separate stores so the borrows split cleanly.
pub struct Capabilities<'a> {
    pub finance: &'a mut dyn finance::FinanceHooks,
    pub tasks: &'a mut dyn tasks::TaskHooks,
    pub notes: &'a mut dyn notes::NoteHooks,
    pub habits: &'a mut dyn habits::HabitHooks,
    pub study: &'a mut dyn study::StudyHooks,
    pub inventory: &'a mut dyn inventory::InventoryHooks,
}

/// What one executor call did.
///
/// A resolution miss is a structured result, not an error: the chat must
/// not crash on a bad match, but the host deserves to know nothing
/// happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every mutation call for the action was applied.
    Applied,
    /// The referenced entity was not in the collection; nothing was mutated.
    NotFound { reference: String },
    /// Nothing to execute at this layer.
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `CHAT` / `NAVIGATE`, surfaced to and handled by the host UI.
    ControlAction,
    /// Action name owned by no module; logged and dropped.
    UnknownAction,
    /// The turn was cancelled before this item ran.
    Cancelled,
}

impl Outcome {
    pub(crate) fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            reference: reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_is_disjoint() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.modules().len(), 6);
    }

    #[test]
    fn test_owner_of_routes_each_action_to_its_module() {
        let registry = Registry::standard().unwrap();
        for module in registry.modules() {
            for action in module.actions {
                let owner = registry.owner_of(action).unwrap();
                assert_eq!(owner.name, module.name, "action {action} misrouted");
            }
        }
    }

    #[test]
    fn test_control_actions_are_unowned() {
        let registry = Registry::standard().unwrap();
        assert!(registry.owner_of(CHAT_ACTION).is_none());
        assert!(registry.owner_of(NAVIGATE_ACTION).is_none());
        assert!(registry.owner_of("MAKE_COFFEE").is_none());
    }

    #[test]
    fn test_duplicate_action_collides_at_startup() {
        let clashing = ModuleDescriptor {
            name: "CLONE",
            actions: finance::descriptor().actions,
            prompt_fragment: "",
        };
        let result = Registry::new(vec![finance::descriptor(), clashing]);
        assert!(result.is_err());
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let module = ModuleDescriptor {
            name: "ROGUE",
            actions: &["CHAT"],
            prompt_fragment: "",
        };
        assert!(Registry::new(vec![module]).is_err());
    }
}
