//! Routing of typed actions to domain executors.
//!
//! The match is exhaustive over the action's domain tag, so "every action
//! routes to exactly one executor" is a compile-time fact rather than a
//! property of scan order. Each executor receives only its own domain's
//! capability subset.

use tracing::debug;

use crate::assistant::action::Action;
use crate::error::AssistantError;
use crate::modules::{
    Capabilities, Outcome, SkipReason, finance, habits, inventory, notes, study, tasks,
};
use crate::services::resolve::Resolver;

/// Executes one action against the host-supplied capabilities.
///
/// Control actions (`Chat`, `Navigate`) are a documented no-op here: the
/// host UI owns them. A batch of N actions is N sequential calls by the
/// orchestrator.
pub fn dispatch(
    action: &Action,
    capabilities: &mut Capabilities<'_>,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        Action::Chat | Action::Navigate { .. } => {
            debug!("control action left to the host");
            Ok(Outcome::Skipped {
                reason: SkipReason::ControlAction,
            })
        }
        Action::Finance(action) => finance::execute(action, &mut *capabilities.finance, resolver),
        Action::Tasks(action) => tasks::execute(action, &mut *capabilities.tasks, resolver),
        Action::Notes(action) => notes::execute(action, &mut *capabilities.notes, resolver),
        Action::Habits(action) => habits::execute(action, &mut *capabilities.habits, resolver),
        Action::Study(action) => study::execute(action, &mut *capabilities.study, resolver),
        Action::Inventory(action) => {
            inventory::execute(action, &mut *capabilities.inventory, resolver)
        }
    }
}
