use crate::db::Database;
use crate::error::{Result, TodoError};
use crate::models::{Task, TaskId};
use crate::repository::TodoRepository;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Which tasks a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.is_completed,
            Filter::Completed => task.is_completed,
        }
    }
}

/// List operations on top of the repository: validation, lookup, ordering
pub struct TodoList<'a> {
    repo: TodoRepository<'a>,
}

impl<'a> TodoList<'a> {
    pub fn new(db: &'a Database) -> Self {
        TodoList {
            repo: TodoRepository::new(db),
        }
    }

    pub fn repository(&self) -> TodoRepository<'a> {
        self.repo
    }

    /// Add a task with a trimmed, non-empty title
    pub fn add(&self, title: &str) -> Result<Task> {
        let title = clean_title(title)?;
        self.repo.insert(title)
    }

    /// Rename a task with a trimmed, non-empty title
    pub fn rename(&self, id: TaskId, title: &str) -> Result<Task> {
        let title = clean_title(title)?;
        if !self.repo.update_title(id, title)? {
            return Err(TodoError::TaskNotFound(id.to_string()));
        }
        self.get(id)
    }

    /// Flip the completion state of a task
    pub fn toggle(&self, id: TaskId) -> Result<Task> {
        let task = self.get(id)?;
        if !self.repo.toggle_completed(id, !task.is_completed)? {
            return Err(TodoError::TaskNotFound(id.to_string()));
        }
        self.get(id)
    }

    /// Delete a task, returning what was removed
    pub fn remove(&self, id: TaskId) -> Result<Task> {
        let task = self.get(id)?;
        if !self.repo.delete(id)? {
            return Err(TodoError::TaskNotFound(id.to_string()));
        }
        Ok(task)
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.repo
            .find(id)?
            .ok_or_else(|| TodoError::TaskNotFound(id.to_string()))
    }

    /// Filtered and ordered view of the current snapshot
    pub fn visible(&self, filter: Filter) -> Result<Vec<Task>> {
        Ok(arrange(self.repo.list_all()?, filter))
    }

    /// Resolve a full id or a unique, case-insensitive id prefix
    pub fn resolve(&self, needle: &str) -> Result<TaskId> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Err(TodoError::TaskNotFound(needle.to_string()));
        }
        if let Ok(id) = needle.parse::<TaskId>() {
            return Ok(id);
        }

        let prefix = needle.to_uppercase();
        let matches: Vec<TaskId> = self
            .repo
            .list_all()?
            .into_iter()
            .map(|t| t.id)
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(TodoError::TaskNotFound(needle.to_string())),
            [id] => Ok(*id),
            many => Err(TodoError::AmbiguousId {
                prefix: needle.to_string(),
                matches: many.iter().map(TaskId::short).collect(),
            }),
        }
    }
}

fn clean_title(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::EmptyTitle);
    }
    Ok(trimmed)
}

/// Filter, then order: active tasks first (newest created first), then
/// completed tasks (most recently completed first, missing timestamps last).
pub fn arrange(tasks: Vec<Task>, filter: Filter) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.into_iter().filter(|t| filter.matches(t)).collect();
    tasks.sort_by(display_order);
    tasks
}

fn display_order(a: &Task, b: &Task) -> Ordering {
    match (a.is_completed, b.is_completed) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => b.created_at.cmp(&a.created_at),
        (true, true) => completion_key(b).cmp(&completion_key(a)),
    }
}

fn completion_key(task: &Task) -> DateTime<Utc> {
    task.completed_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}
