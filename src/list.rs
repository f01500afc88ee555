//! In-memory task list state.
//!
//! Holds the tasks in server order plus the interaction state that does not
//! belong on the records themselves (which task is being edited).

use crate::types::{Filter, Task, TaskCounts, TaskId};

#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    /// At most one task is edited at a time.
    editing: Option<TaskId>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            editing: None,
        }
    }

    /// Replace the whole list with a fresh server listing.
    ///
    /// An edit in progress survives only if its task is still present.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        if let Some(ref id) = self.editing
            && !self.contains(id)
        {
            self.editing = None;
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Append a task the server just created. A task with the same id is
    /// replaced in place instead, keeping ids unique.
    pub fn push(&mut self, task: Task) {
        if !self.apply_update(task.clone()) {
            self.tasks.push(task);
        }
    }

    /// Overwrite the task with the same id. The last update applied wins.
    /// Returns false if no such task is in the list.
    pub fn apply_update(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    /// Remove exactly the task with `id`, keeping the others in order.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        Some(self.tasks.remove(index))
    }

    /// Tasks passing `filter`, in list order.
    pub fn visible(&self, filter: Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        TaskCounts {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    /// Start editing `id`, ending any other edit. Returns false for unknown ids.
    pub fn start_editing(&mut self, id: &TaskId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.editing = Some(id.clone());
        true
    }

    /// Stop editing `id`; editing of another task is left alone.
    pub fn stop_editing(&mut self, id: &TaskId) {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
    }

    pub fn is_editing(&self, id: &TaskId) -> bool {
        self.editing.as_ref() == Some(id)
    }

    pub fn editing(&self) -> Option<&TaskId> {
        self.editing.as_ref()
    }
}
