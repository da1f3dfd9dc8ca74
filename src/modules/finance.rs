//! Finance module: income/expense entries, budgets, savings goals.
//!
//! Withdrawing from savings is the one compound operation in the system:
//! it records the withdrawal against the goal and then creates the matching
//! expense entry. The two mutations are a named saga: if the second step
//! fails the error says exactly which half was applied, because no rollback
//! is attempted.

use chrono::{Local, NaiveDate};
use color_eyre::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::assistant::action::{
    bool_or, date_or_today, optional_string, require_amount, require_string, string_or,
};
use crate::error::AssistantError;
use crate::modules::{ModuleDescriptor, Outcome};
use crate::services::resolve::{Resolver, resolve_entity};

pub const ACTIONS: &[&str] = &[
    "ADD_EXPENSE",
    "ADD_INCOME",
    "SET_BUDGET",
    "DELETE_BUDGET",
    "ADD_SAVINGS_GOAL",
    "ADD_TO_SAVINGS",
    "WITHDRAW_FROM_SAVINGS",
    "DELETE_SAVINGS_GOAL",
];

const PROMPT_FRAGMENT: &str = r#"
FINANCE RULES:
- ADD_EXPENSE / ADD_INCOME data: {"name": "what it was", "amount": number, "category": "Food|Transport|Bills|Fun|General|...", "date": "YYYY-MM-DD", "is_special": bool}
  Only name and amount are needed; category defaults to General, date to today.
  Mark is_special true for one-off exceptional entries (gifts, repairs) the user flags as unusual.
- SET_BUDGET data: {"category": "...", "amount": monthly limit}. Setting an existing category replaces its limit.
- DELETE_BUDGET data: {"category": "..."}
- ADD_SAVINGS_GOAL data: {"name": "...", "target": number}
- ADD_TO_SAVINGS data: {"name": "goal name", "amount": number}
- WITHDRAW_FROM_SAVINGS data: {"name": "goal name", "amount": number}
  This also records the withdrawal as an expense automatically; never emit a separate ADD_EXPENSE for it.
- Users rarely name goals exactly. "laptop savings" means whichever goal sounds like a laptop; pass the words they used.

Examples:
"spent 200 on coffee and 500 on groceries" ->
{"actions":[{"action":"ADD_EXPENSE","data":{"name":"coffee","amount":200,"category":"Food"}},{"action":"ADD_EXPENSE","data":{"name":"groceries","amount":500,"category":"Food"}}],"response_text":"Logged both: 200 for coffee and 500 for groceries."}
"take 1000 out of my laptop fund" ->
{"action":"WITHDRAW_FROM_SAVINGS","data":{"name":"laptop","amount":1000},"response_text":"Withdrew 1000 from your laptop fund and logged it as an expense."}
"#;

pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: "FINANCE",
        actions: ACTIONS,
        prompt_fragment: PROMPT_FRAGMENT,
    }
}

/// Whether an entry adds to or draws from the user's money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

/// Parameters for a new finance entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub kind: EntryKind,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub is_special: bool,
}

/// Snapshot of a budget row, as loaded by the host.
#[derive(Debug, Clone)]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub limit: f64,
}

/// Snapshot of a savings goal, as loaded by the host.
#[derive(Debug, Clone)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target: f64,
    pub saved: f64,
}

/// The finance capability subset. Reads are snapshots for matching; writes
/// go through the host's own persistence.
pub trait FinanceHooks {
    fn budgets(&self) -> &[Budget];
    fn savings_goals(&self) -> &[SavingsGoal];
    fn add_entry(&mut self, entry: NewEntry) -> Result<()>;
    fn set_budget(&mut self, category: &str, limit: f64) -> Result<()>;
    fn delete_budget(&mut self, id: &str) -> Result<()>;
    fn add_savings_goal(&mut self, name: &str, target: f64) -> Result<()>;
    fn deposit_to_goal(&mut self, id: &str, amount: f64) -> Result<()>;
    fn withdraw_from_goal(&mut self, id: &str, amount: f64) -> Result<()>;
    fn delete_savings_goal(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinanceAction {
    AddEntry(NewEntry),
    SetBudget { category: String, limit: f64 },
    DeleteBudget { category: String },
    AddSavingsGoal { name: String, target: f64 },
    AddToSavings { name: String, amount: f64 },
    WithdrawFromSavings { name: String, amount: f64 },
    DeleteSavingsGoal { name: String },
}

pub(crate) fn decode(
    action: &str,
    data: &Map<String, Value>,
) -> Option<Result<FinanceAction, AssistantError>> {
    let decoded = match action {
        "ADD_EXPENSE" => decode_entry(action, EntryKind::Expense, data),
        "ADD_INCOME" => decode_entry(action, EntryKind::Income, data),
        "SET_BUDGET" => decode_set_budget(action, data),
        "DELETE_BUDGET" => {
            require_string(action, data, "category").map(|category| FinanceAction::DeleteBudget { category })
        }
        "ADD_SAVINGS_GOAL" => decode_add_goal(action, data),
        "ADD_TO_SAVINGS" => decode_goal_amount(action, data)
            .map(|(name, amount)| FinanceAction::AddToSavings { name, amount }),
        "WITHDRAW_FROM_SAVINGS" => decode_goal_amount(action, data)
            .map(|(name, amount)| FinanceAction::WithdrawFromSavings { name, amount }),
        "DELETE_SAVINGS_GOAL" => {
            require_string(action, data, "name").map(|name| FinanceAction::DeleteSavingsGoal { name })
        }
        _ => return None,
    };
    Some(decoded)
}

fn decode_set_budget(
    action: &str,
    data: &Map<String, Value>,
) -> Result<FinanceAction, AssistantError> {
    Ok(FinanceAction::SetBudget {
        category: require_string(action, data, "category")?,
        limit: require_amount(action, data, "amount")?,
    })
}

fn decode_add_goal(
    action: &str,
    data: &Map<String, Value>,
) -> Result<FinanceAction, AssistantError> {
    Ok(FinanceAction::AddSavingsGoal {
        name: require_string(action, data, "name")?,
        target: require_amount(action, data, "target")?,
    })
}

fn decode_goal_amount(
    action: &str,
    data: &Map<String, Value>,
) -> Result<(String, f64), AssistantError> {
    Ok((
        require_string(action, data, "name")?,
        require_amount(action, data, "amount")?,
    ))
}

fn decode_entry(
    action: &str,
    kind: EntryKind,
    data: &Map<String, Value>,
) -> Result<FinanceAction, AssistantError> {
    let category = string_or(data, "category", "General");
    // The model occasionally drops the name for obvious entries; fall back
    // to the category so the row is still legible.
    let name = optional_string(data, "name").unwrap_or_else(|| category.clone());
    Ok(FinanceAction::AddEntry(NewEntry {
        kind,
        name,
        amount: require_amount(action, data, "amount")?,
        category,
        date: date_or_today(data, "date"),
        is_special: bool_or(data, "is_special", false),
    }))
}

pub(crate) fn execute(
    action: &FinanceAction,
    hooks: &mut dyn FinanceHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    match action {
        FinanceAction::AddEntry(entry) => {
            hooks
                .add_entry(entry.clone())
                .map_err(|error| AssistantError::hook("add_entry", error))?;
            Ok(Outcome::Applied)
        }
        FinanceAction::SetBudget { category, limit } => {
            hooks
                .set_budget(category, *limit)
                .map_err(|error| AssistantError::hook("set_budget", error))?;
            Ok(Outcome::Applied)
        }
        FinanceAction::DeleteBudget { category } => {
            let Some(budget) = resolve_entity(resolver, category, hooks.budgets(), |b| &b.category)
            else {
                warn!(reference = %category, "no budget matched; skipping delete");
                return Ok(Outcome::not_found(category.clone()));
            };
            let id = budget.id.clone();
            hooks
                .delete_budget(&id)
                .map_err(|error| AssistantError::hook("delete_budget", error))?;
            Ok(Outcome::Applied)
        }
        FinanceAction::AddSavingsGoal { name, target } => {
            hooks
                .add_savings_goal(name, *target)
                .map_err(|error| AssistantError::hook("add_savings_goal", error))?;
            Ok(Outcome::Applied)
        }
        FinanceAction::AddToSavings { name, amount } => {
            let Some(goal) = resolve_entity(resolver, name, hooks.savings_goals(), |g| &g.name)
            else {
                warn!(reference = %name, "no savings goal matched; skipping deposit");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = goal.id.clone();
            hooks
                .deposit_to_goal(&id, *amount)
                .map_err(|error| AssistantError::hook("deposit_to_goal", error))?;
            Ok(Outcome::Applied)
        }
        FinanceAction::WithdrawFromSavings { name, amount } => {
            withdraw_from_savings(name, *amount, hooks, resolver)
        }
        FinanceAction::DeleteSavingsGoal { name } => {
            let Some(goal) = resolve_entity(resolver, name, hooks.savings_goals(), |g| &g.name)
            else {
                warn!(reference = %name, "no savings goal matched; skipping delete");
                return Ok(Outcome::not_found(name.clone()));
            };
            let id = goal.id.clone();
            hooks
                .delete_savings_goal(&id)
                .map_err(|error| AssistantError::hook("delete_savings_goal", error))?;
            Ok(Outcome::Applied)
        }
    }
}

/// The withdraw saga: goal mutation first, expense entry second.
fn withdraw_from_savings(
    name: &str,
    amount: f64,
    hooks: &mut dyn FinanceHooks,
    resolver: &dyn Resolver,
) -> Result<Outcome, AssistantError> {
    let Some(goal) = resolve_entity(resolver, name, hooks.savings_goals(), |g| &g.name) else {
        warn!(reference = %name, "no savings goal matched; skipping withdrawal");
        return Ok(Outcome::not_found(name.to_string()));
    };
    let goal_id = goal.id.clone();
    let goal_name = goal.name.clone();

    hooks
        .withdraw_from_goal(&goal_id, amount)
        .map_err(|error| AssistantError::hook("withdraw_from_goal", error))?;

    let entry = NewEntry {
        kind: EntryKind::Expense,
        name: format!("Withdrawal from {goal_name}"),
        amount,
        category: "Savings".to_string(),
        date: Local::now().date_naive(),
        is_special: false,
    };
    hooks
        .add_entry(entry)
        .map_err(|error| AssistantError::SagaPartial {
            saga: "withdraw_from_savings",
            completed: "withdraw_from_goal",
            failed: "add_entry",
            detail: error.to_string(),
        })?;

    Ok(Outcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolve::SubstringResolver;
    use serde_json::json;

    #[derive(Default)]
    struct MemFinance {
        budgets: Vec<Budget>,
        goals: Vec<SavingsGoal>,
        entries: Vec<NewEntry>,
        calls: Vec<&'static str>,
        fail_add_entry: bool,
    }

    impl FinanceHooks for MemFinance {
        fn budgets(&self) -> &[Budget] {
            &self.budgets
        }
        fn savings_goals(&self) -> &[SavingsGoal] {
            &self.goals
        }
        fn add_entry(&mut self, entry: NewEntry) -> Result<()> {
            self.calls.push("add_entry");
            if self.fail_add_entry {
                return Err(color_eyre::eyre::eyre!("storage rejected entry"));
            }
            self.entries.push(entry);
            Ok(())
        }
        fn set_budget(&mut self, category: &str, limit: f64) -> Result<()> {
            self.calls.push("set_budget");
            self.budgets.push(Budget {
                id: format!("b{}", self.budgets.len() + 1),
                category: category.to_string(),
                limit,
            });
            Ok(())
        }
        fn delete_budget(&mut self, id: &str) -> Result<()> {
            self.calls.push("delete_budget");
            self.budgets.retain(|b| b.id != id);
            Ok(())
        }
        fn add_savings_goal(&mut self, name: &str, target: f64) -> Result<()> {
            self.calls.push("add_savings_goal");
            self.goals.push(SavingsGoal {
                id: format!("g{}", self.goals.len() + 1),
                name: name.to_string(),
                target,
                saved: 0.0,
            });
            Ok(())
        }
        fn deposit_to_goal(&mut self, id: &str, amount: f64) -> Result<()> {
            self.calls.push("deposit_to_goal");
            if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
                goal.saved += amount;
            }
            Ok(())
        }
        fn withdraw_from_goal(&mut self, id: &str, amount: f64) -> Result<()> {
            self.calls.push("withdraw_from_goal");
            if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
                goal.saved -= amount;
            }
            Ok(())
        }
        fn delete_savings_goal(&mut self, id: &str) -> Result<()> {
            self.calls.push("delete_savings_goal");
            self.goals.retain(|g| g.id != id);
            Ok(())
        }
    }

    fn laptop_fund() -> MemFinance {
        MemFinance {
            goals: vec![SavingsGoal {
                id: "g1".to_string(),
                name: "Laptop Fund".to_string(),
                target: 5000.0,
                saved: 2000.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_add_expense_calls_add_entry_once() {
        let mut hooks = MemFinance::default();
        let action = decode("ADD_EXPENSE", json!({"name": "coffee", "amount": 200, "category": "Food"}).as_object().unwrap())
            .unwrap()
            .unwrap();
        let outcome = execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(hooks.calls, vec!["add_entry"]);
        assert_eq!(hooks.entries[0].kind, EntryKind::Expense);
        assert_eq!(hooks.entries[0].amount, 200.0);
        assert_eq!(hooks.entries[0].category, "Food");
    }

    #[test]
    fn test_withdraw_saga_runs_both_steps_in_order() {
        let mut hooks = laptop_fund();
        let action = FinanceAction::WithdrawFromSavings {
            name: "Laptop".to_string(),
            amount: 1000.0,
        };
        let outcome = execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(hooks.calls, vec!["withdraw_from_goal", "add_entry"]);
        assert_eq!(hooks.goals[0].saved, 1000.0);
        assert_eq!(hooks.entries[0].name, "Withdrawal from Laptop Fund");
        assert_eq!(hooks.entries[0].kind, EntryKind::Expense);
    }

    #[test]
    fn test_withdraw_second_step_failure_is_partial_saga() {
        let mut hooks = laptop_fund();
        hooks.fail_add_entry = true;
        let action = FinanceAction::WithdrawFromSavings {
            name: "laptop".to_string(),
            amount: 500.0,
        };
        let error = execute(&action, &mut hooks, &SubstringResolver).unwrap_err();
        match error {
            AssistantError::SagaPartial { completed, failed, .. } => {
                assert_eq!(completed, "withdraw_from_goal");
                assert_eq!(failed, "add_entry");
            }
            other => panic!("unexpected error: {other}"),
        }
        // First step was applied, no rollback.
        assert_eq!(hooks.goals[0].saved, 1500.0);
    }

    #[test]
    fn test_withdraw_unknown_goal_is_not_found() {
        let mut hooks = laptop_fund();
        let action = FinanceAction::WithdrawFromSavings {
            name: "yacht".to_string(),
            amount: 500.0,
        };
        let outcome = execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(outcome, Outcome::not_found("yacht"));
        assert!(hooks.calls.is_empty());
    }

    #[test]
    fn test_delete_budget_resolves_by_category() {
        let mut hooks = MemFinance {
            budgets: vec![
                Budget {
                    id: "b1".to_string(),
                    category: "Groceries".to_string(),
                    limit: 400.0,
                },
                Budget {
                    id: "b2".to_string(),
                    category: "Fun".to_string(),
                    limit: 100.0,
                },
            ],
            ..Default::default()
        };
        let action = FinanceAction::DeleteBudget {
            category: "groc".to_string(),
        };
        execute(&action, &mut hooks, &SubstringResolver).unwrap();
        assert_eq!(hooks.budgets.len(), 1);
        assert_eq!(hooks.budgets[0].category, "Fun");
    }

    #[test]
    fn test_entry_name_falls_back_to_category() {
        let action = decode("ADD_INCOME", json!({"amount": 4000, "category": "Salary"}).as_object().unwrap())
            .unwrap()
            .unwrap();
        match action {
            FinanceAction::AddEntry(entry) => {
                assert_eq!(entry.kind, EntryKind::Income);
                assert_eq!(entry.name, "Salary");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
