//! Simple to-do list.

use crate::store::{self, KvStore, TASKS_KEY};
use crate::{Error, Result, Task};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Ordered task list, oldest first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn load(store: &dyn KvStore) -> Result<Self> {
        Ok(Self::from_tasks(store::load_or_default(store, TASKS_KEY)?))
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        store::save_json(store, TASKS_KEY, &self.tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn add(&mut self, title: &str, now: DateTime<Utc>) -> Result<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("task title is empty".into()));
        }
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            done: false,
            created_at: now,
        };
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    /// Flip a task between done and pending; returns the new state
    pub fn toggle(&mut self, id: Uuid) -> Result<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
        task.done = !task.done;
        Ok(task.done)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
        Ok(self.tasks.remove(idx))
    }

    /// Drop completed tasks; returns how many were removed
    pub fn clear_done(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.done);
        before - self.tasks.len()
    }

    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    /// Find a task by full id or by a unique id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Uuid> {
        resolve_prefix(self.tasks.iter().map(|t| t.id), id_or_prefix, "task")
    }
}

/// Match a full UUID or a unique prefix of one
///
/// Lets the command line accept the short ids it prints.
pub(crate) fn resolve_prefix<I>(ids: I, needle: &str, what: &str) -> Result<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return Err(Error::Validation(format!("{} id is empty", what)));
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(Error::NotFound(format!("{} {}", what, needle))),
        _ => Err(Error::Validation(format!(
            "{} id '{}' is ambiguous ({} matches)",
            what,
            needle,
            matches.len()
        ))),
    }
}
