//! Application state: the task list, its filter and preferences, driven by
//! user actions against a [`TaskService`].
//!
//! Local state changes only after the backend confirms an action, so a
//! failed call leaves the list as it was (possibly stale) and the error is
//! handed back to the caller to report.

use crate::api::TaskService;
use crate::error::{ClientError, ClientResult};
use crate::list::TaskList;
use crate::preferences::Preferences;
use crate::types::{Filter, NewTask, Task, TaskCounts, TaskId, TaskPatch};
use tracing::{debug, info};

pub struct TodoApp<S: TaskService> {
    service: S,
    list: TaskList,
    filter: Filter,
    preferences: Preferences,
}

impl<S: TaskService> TodoApp<S> {
    pub fn new(service: S, preferences: Preferences) -> Self {
        Self {
            service,
            list: TaskList::new(),
            filter: Filter::default(),
            preferences,
        }
    }

    pub fn list(&self) -> &TaskList {
        &self.list
    }

    /// Replace the local list with the backend's.
    pub async fn load(&mut self) -> ClientResult<&[Task]> {
        let tasks = self.service.list_tasks().await?;
        debug!(count = tasks.len(), "Task list loaded");
        self.list.replace_all(tasks);
        Ok(self.list.tasks())
    }

    /// Create a pending task. Blank titles are ignored without a request.
    pub async fn add(&mut self, title: &str) -> ClientResult<Option<Task>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring blank task title");
            return Ok(None);
        }
        let created = self.service.create_task(&NewTask::pending(title)).await?;
        info!(id = %created.id, title = %created.title, "Task added");
        self.list.push(created.clone());
        Ok(Some(created))
    }

    /// Flip completion of `id`.
    pub async fn toggle(&mut self, id: &TaskId) -> ClientResult<Task> {
        let completed = self.require(id)?.completed;
        self.set_completed(id, !completed).await
    }

    /// Set completion of `id` to `completed`.
    pub async fn set_completed(&mut self, id: &TaskId, completed: bool) -> ClientResult<Task> {
        self.require(id)?;
        let updated = self
            .service
            .update_task(id, &TaskPatch::completed(completed))
            .await?;
        info!(id = %updated.id, completed = updated.completed, "Task completion updated");
        self.list.apply_update(updated.clone());
        Ok(updated)
    }

    /// Change the title of `id`. Blank titles are ignored without a request.
    pub async fn rename(&mut self, id: &TaskId, title: &str) -> ClientResult<Option<Task>> {
        self.require(id)?;
        let title = title.trim();
        if title.is_empty() {
            debug!(id = %id, "Ignoring blank task title");
            return Ok(None);
        }
        let updated = self.service.update_task(id, &TaskPatch::title(title)).await?;
        info!(id = %updated.id, title = %updated.title, "Task renamed");
        self.list.apply_update(updated.clone());
        Ok(Some(updated))
    }

    /// Delete `id`; the local copy is dropped once the backend confirms.
    pub async fn delete(&mut self, id: &TaskId) -> ClientResult<Task> {
        self.require(id)?;
        self.service.delete_task(id).await?;
        let removed = self
            .list
            .remove(id)
            .ok_or_else(|| ClientError::task_not_found(id))?;
        info!(id = %id, "Task deleted");
        Ok(removed)
    }

    pub fn start_editing(&mut self, id: &TaskId) -> ClientResult<()> {
        if self.list.start_editing(id) {
            Ok(())
        } else {
            Err(ClientError::task_not_found(id))
        }
    }

    pub fn stop_editing(&mut self, id: &TaskId) {
        self.list.stop_editing(id);
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Tasks passing the current filter.
    pub fn visible(&self) -> Vec<&Task> {
        self.list.visible(self.filter)
    }

    pub fn counts(&self) -> TaskCounts {
        self.list.counts()
    }

    pub fn dark_mode(&self) -> bool {
        self.preferences.dark_mode()
    }

    pub fn set_dark_mode(&self, enabled: bool) -> ClientResult<()> {
        self.preferences.set_dark_mode(enabled)
    }

    pub fn toggle_dark_mode(&self) -> ClientResult<bool> {
        self.preferences.toggle_dark_mode()
    }

    fn require(&self, id: &TaskId) -> ClientResult<&Task> {
        self.list
            .get(id)
            .ok_or_else(|| ClientError::task_not_found(id))
    }
}
