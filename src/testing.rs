//! In-memory hook fakes shared by dispatcher and orchestrator tests.

use chrono::NaiveDate;
use color_eyre::Result;

use crate::modules::Capabilities;
use crate::modules::finance::{Budget, FinanceHooks, NewEntry, SavingsGoal};
use crate::modules::habits::{HabitHooks, HabitSnapshot};
use crate::modules::inventory::{InventoryHooks, ItemSnapshot};
use crate::modules::notes::{NoteHooks, NoteSnapshot};
use crate::modules::study::{Chapter, Part, Preset, PresetScope, StudyHooks, Subject};
use crate::modules::tasks::{NewTask, TaskHooks, TaskSnapshot};

/// A complete six-domain fake host. Each domain is a separate store so the
/// borrows behind `Capabilities` split cleanly, the same way a real host
/// would structure it.
#[derive(Default)]
pub(crate) struct MemHost {
    pub finance: MemFinance,
    pub tasks: MemTasks,
    pub notes: MemNotes,
    pub habits: MemHabits,
    pub study: MemStudy,
    pub inventory: MemInventory,
}

impl MemHost {
    pub fn capabilities(&mut self) -> Capabilities<'_> {
        Capabilities {
            finance: &mut self.finance,
            tasks: &mut self.tasks,
            notes: &mut self.notes,
            habits: &mut self.habits,
            study: &mut self.study,
            inventory: &mut self.inventory,
        }
    }

    pub fn mutation_count(&self) -> usize {
        self.finance.mutations
            + self.tasks.mutations
            + self.notes.mutations
            + self.habits.mutations
            + self.study.mutations
            + self.inventory.mutations
    }

    pub fn is_untouched(&self) -> bool {
        self.mutation_count() == 0
    }
}

#[derive(Default)]
pub(crate) struct MemFinance {
    pub budgets: Vec<Budget>,
    pub goals: Vec<SavingsGoal>,
    pub entries: Vec<NewEntry>,
    pub mutations: usize,
}

impl FinanceHooks for MemFinance {
    fn budgets(&self) -> &[Budget] {
        &self.budgets
    }
    fn savings_goals(&self) -> &[SavingsGoal] {
        &self.goals
    }
    fn add_entry(&mut self, entry: NewEntry) -> Result<()> {
        self.mutations += 1;
        self.entries.push(entry);
        Ok(())
    }
    fn set_budget(&mut self, category: &str, limit: f64) -> Result<()> {
        self.mutations += 1;
        self.budgets.push(Budget {
            id: format!("b{}", self.budgets.len() + 1),
            category: category.to_string(),
            limit,
        });
        Ok(())
    }
    fn delete_budget(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.budgets.retain(|b| b.id != id);
        Ok(())
    }
    fn add_savings_goal(&mut self, name: &str, target: f64) -> Result<()> {
        self.mutations += 1;
        self.goals.push(SavingsGoal {
            id: format!("g{}", self.goals.len() + 1),
            name: name.to_string(),
            target,
            saved: 0.0,
        });
        Ok(())
    }
    fn deposit_to_goal(&mut self, id: &str, amount: f64) -> Result<()> {
        self.mutations += 1;
        if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
            goal.saved += amount;
        }
        Ok(())
    }
    fn withdraw_from_goal(&mut self, id: &str, amount: f64) -> Result<()> {
        self.mutations += 1;
        if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
            goal.saved -= amount;
        }
        Ok(())
    }
    fn delete_savings_goal(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.goals.retain(|g| g.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemTasks {
    pub tasks: Vec<TaskSnapshot>,
    pub completed: Vec<String>,
    pub mutations: usize,
}

impl TaskHooks for MemTasks {
    fn tasks(&self) -> &[TaskSnapshot] {
        &self.tasks
    }
    fn add_task(&mut self, task: NewTask) -> Result<()> {
        self.mutations += 1;
        self.tasks.push(TaskSnapshot {
            id: format!("t{}", self.tasks.len() + 1),
            title: task.title,
            completed: false,
        });
        Ok(())
    }
    fn complete_task(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.completed.push(id.to_string());
        Ok(())
    }
    fn delete_task(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemNotes {
    pub notes: Vec<NoteSnapshot>,
    pub mutations: usize,
}

impl NoteHooks for MemNotes {
    fn notes(&self) -> &[NoteSnapshot] {
        &self.notes
    }
    fn add_note(&mut self, title: &str, _content: &str) -> Result<()> {
        self.mutations += 1;
        self.notes.push(NoteSnapshot {
            id: format!("n{}", self.notes.len() + 1),
            title: title.to_string(),
        });
        Ok(())
    }
    fn delete_note(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.notes.retain(|n| n.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemHabits {
    pub habits: Vec<HabitSnapshot>,
    pub completions: Vec<(String, NaiveDate)>,
    pub mutations: usize,
}

impl HabitHooks for MemHabits {
    fn habits(&self) -> &[HabitSnapshot] {
        &self.habits
    }
    fn add_habit(&mut self, name: &str) -> Result<()> {
        self.mutations += 1;
        self.habits.push(HabitSnapshot {
            id: format!("h{}", self.habits.len() + 1),
            name: name.to_string(),
        });
        Ok(())
    }
    fn complete_habit(&mut self, id: &str, date: NaiveDate) -> Result<()> {
        self.mutations += 1;
        self.completions.push((id.to_string(), date));
        Ok(())
    }
    fn delete_habit(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.habits.retain(|h| h.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemStudy {
    pub subjects: Vec<Subject>,
    pub chapters: Vec<Chapter>,
    pub parts: Vec<Part>,
    pub presets: Vec<Preset>,
    pub applied: Vec<(String, String, PresetScope)>,
    pub mutations: usize,
}

impl StudyHooks for MemStudy {
    fn subjects(&self) -> &[Subject] {
        &self.subjects
    }
    fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }
    fn parts(&self) -> &[Part] {
        &self.parts
    }
    fn presets(&self) -> &[Preset] {
        &self.presets
    }
    fn add_subject(&mut self, name: &str) -> Result<()> {
        self.mutations += 1;
        self.subjects.push(Subject {
            id: format!("s{}", self.subjects.len() + 1),
            name: name.to_string(),
        });
        Ok(())
    }
    fn add_chapter(&mut self, subject_id: &str, name: &str) -> Result<()> {
        self.mutations += 1;
        self.chapters.push(Chapter {
            id: format!("c{}", self.chapters.len() + 1),
            subject_id: subject_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }
    fn add_part(&mut self, chapter_id: &str, name: &str) -> Result<()> {
        self.mutations += 1;
        self.parts.push(Part {
            id: format!("p{}", self.parts.len() + 1),
            chapter_id: chapter_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }
    fn complete_part(&mut self, _id: &str) -> Result<()> {
        self.mutations += 1;
        Ok(())
    }
    fn apply_preset(&mut self, preset_id: &str, chapter_id: &str, scope: PresetScope) -> Result<()> {
        self.mutations += 1;
        self.applied
            .push((preset_id.to_string(), chapter_id.to_string(), scope));
        Ok(())
    }
    fn delete_subject(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.subjects.retain(|s| s.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemInventory {
    pub items: Vec<ItemSnapshot>,
    pub mutations: usize,
}

impl InventoryHooks for MemInventory {
    fn items(&self) -> &[ItemSnapshot] {
        &self.items
    }
    fn add_item(&mut self, name: &str, quantity: u32, _category: &str) -> Result<()> {
        self.mutations += 1;
        self.items.push(ItemSnapshot {
            id: format!("i{}", self.items.len() + 1),
            name: name.to_string(),
            quantity,
        });
        Ok(())
    }
    fn update_quantity(&mut self, id: &str, quantity: u32) -> Result<()> {
        self.mutations += 1;
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
        Ok(())
    }
    fn delete_item(&mut self, id: &str) -> Result<()> {
        self.mutations += 1;
        self.items.retain(|i| i.id != id);
        Ok(())
    }
}
