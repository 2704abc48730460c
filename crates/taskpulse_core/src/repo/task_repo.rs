//! Task repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Hand out immutable task snapshots to projection and mutation handlers.
//! - Keep copy-on-write snapshot identity stable between mutations.
//!
//! # Invariants
//! - Write paths must call `Task::validate()` before mutating.
//! - Every successful write replaces the snapshot `Arc`; reads never do.
//! - Snapshot order is insertion order.

use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::projection::TaskCollection;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("task already exists: {0}")]
    Duplicate(TaskId),
    #[error("subtask `{subtask}` not found in task {task}")]
    SubtaskNotFound { task: TaskId, subtask: String },
}

/// Repository interface for task snapshots and writes.
pub trait TaskRepository {
    /// Current collection. Same `Arc` until the next successful write.
    fn snapshot(&self) -> TaskCollection;
    fn get(&self, id: &str) -> Option<Task>;
    fn insert(&self, task: Task) -> RepoResult<()>;
    /// Replaces the task with the same id. Returns the previous value.
    fn update(&self, task: Task) -> RepoResult<Task>;
    fn remove(&self, id: &str) -> RepoResult<Task>;
}

/// Process-local copy-on-write repository.
pub struct InMemoryTaskRepository {
    tasks: RwLock<TaskCollection>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Seeds the repository after validating every task.
    pub fn from_tasks(tasks: Vec<Task>) -> RepoResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for task in &tasks {
            task.validate()?;
            if !seen.insert(task.id.as_str()) {
                return Err(RepoError::Duplicate(task.id.clone()));
            }
        }
        Ok(Self {
            tasks: RwLock::new(Arc::new(tasks)),
        })
    }

    fn read(&self) -> TaskCollection {
        let guard = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    fn write<T>(&self, apply: impl FnOnce(&mut Vec<Task>) -> RepoResult<T>) -> RepoResult<T> {
        let mut guard = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Task> = (**guard).clone();
        let value = apply(&mut next)?;
        *guard = Arc::new(next);
        Ok(value)
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn snapshot(&self) -> TaskCollection {
        self.read()
    }

    fn get(&self, id: &str) -> Option<Task> {
        self.read().iter().find(|task| task.id == id).cloned()
    }

    fn insert(&self, task: Task) -> RepoResult<()> {
        task.validate()?;
        self.write(|tasks| {
            if tasks.iter().any(|existing| existing.id == task.id) {
                return Err(RepoError::Duplicate(task.id));
            }
            tasks.push(task);
            Ok(())
        })
    }

    fn update(&self, task: Task) -> RepoResult<Task> {
        task.validate()?;
        self.write(|tasks| {
            let slot = tasks
                .iter_mut()
                .find(|existing| existing.id == task.id)
                .ok_or_else(|| RepoError::NotFound(task.id.clone()))?;
            Ok(std::mem::replace(slot, task))
        })
    }

    fn remove(&self, id: &str) -> RepoResult<Task> {
        self.write(|tasks| {
            let index = tasks
                .iter()
                .position(|existing| existing.id == id)
                .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
            Ok(tasks.remove(index))
        })
    }
}
