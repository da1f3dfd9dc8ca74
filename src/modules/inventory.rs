//! Inventory module: items with quantities.

use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{quantity_or, require_string, string_or};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &[
    "ADD_INVENTORY_ITEM",
    "UPDATE_INVENTORY_QUANTITY",
    "DELETE_INVENTORY_ITEM",
];

const PROMPT_FRAGMENT: &str = r#"
INVENTORY RULES:
- ADD_INVENTORY_ITEM data: {"name": "...", "quantity": number, "category": "..."}
  Quantity defaults to 1, category to general.
- UPDATE_INVENTORY_QUANTITY data: {"name": "the item the user means", "quantity": new absolute count}
- DELETE_INVENTORY_ITEM data: {"name": "the item the user means"}

Example:
"we're down to 2 coffee filters" ->
{"action":"UPDATE_INVENTORY_QUANTITY","data":{"name":"coffee filters","quantity":2},"response_text":"Updated coffee filters to 2."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "INVENTORY",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

/// Snapshot of an inventory item, as loaded by the host.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

/// The inventory capability subset.
pub trait InventoryHooks {
    fn items(&self) -> &[ItemSnapshot];
    fn add_item(&mut self, name: &str, quantity: u32, category: &str) -> Result<()>;
    fn update_quantity(&mut self, id: &str, quantity: u32) -> Result<()>;
    fn delete_item(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum InventoryAction {
    AddItem {
        name: String,
        quantity: u32,
        category: String,
    },
    UpdateQuantity { name: String, quantity: u32 },
    DeleteItem { name: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<InventoryAction, AssistantError>> {
    let decoded = match action {
        "ADD_INVENTORY_ITEM" => require_string(action, data, "name").map(|name| {
            InventoryAction::AddItem {
                name,
                quantity: quantity_or(data, "quantity", 1),
                category: string_or(data, "category", "general"),
            }
        }),
        "UPDATE_INVENTORY_QUANTITY" => require_string(action, data, "name").map(|name| {
            InventoryAction::UpdateQuantity {
                name,
                quantity: quantity_or(data, "quantity", 0),
            }
        }),
        "DELETE_INVENTORY_ITEM" => {
            require_string(action, data, "name").map(|name| InventoryAction::DeleteItem { name })
        }
        _ => return None,
    };
    Some(decoded)
}

pub(crate) fn execute(
    action: &InventoryAction,
    hooks: &mut dyn InventoryHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        InventoryAction::AddItem {
            name,
            quantity,
            category,
        } => {
            hooks
                .add_item(name, *quantity, category)
                .map_err(|error| AssistantError::hook("add_item", error))?;
            Ok(Outcome::Applied)
        }
        InventoryAction::UpdateQuantity { name, quantity } => {
            let Some(item) = resolve_entity(resolver, name, hooks.items(), |i| &i.name) else {
                warn!(reference = %name, "no inventory item matched; skipping update");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = item.id.clone();
            hooks
                .update_quantity(&id, *quantity)
                .map_err(|error| AssistantError::hook("update_quantity", error))?;
            Ok(Outcome::Applied)
        }
        InventoryAction::DeleteItem { name } => {
            let Some(item) = resolve_entity(resolver, name, hooks.items(), |i| &i.name) else {
                warn!(reference = %name, "no inventory item matched; skipping delete");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = item.id.clone();
            hooks
                .delete_item(&id)
                .map_err(|error| AssistantError::hook("delete_item", error))?;
            Ok(Outcome::Applied)
        }
    }
}
