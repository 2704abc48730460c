//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record consumed by scoring, projection and
//!   notification scheduling.
//! - Provide lifecycle helpers for completion and subtask toggles.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `completed_at` is present only while `status == TaskStatus::Completed`;
//!   reverting to pending clears it.
//! - `created_at` is set once at creation and never mutated by helpers.
//! - `created_at <= deadline` is expected but not enforced here.
//!
//! # See also
//! - crate::scoring for the derived score/health values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

/// Opaque stable task identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = String;

/// User-assigned importance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Base score contribution for this tier.
    pub fn weight(self) -> f64 {
        match self {
            Self::High => 100.0,
            Self::Medium => 50.0,
            Self::Low => 10.0,
        }
    }

    /// Stable wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Checklist item owned by exactly one parent task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Unique within the parent task only.
    pub id: String,
    pub title: String,
    pub is_completed: bool,
}

impl Subtask {
    /// Creates an open subtask with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            is_completed: false,
        }
    }
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("task id cannot be empty")]
    EmptyId,
    #[error("task `{0}` title cannot be empty")]
    EmptyTitle(TaskId),
    #[error("task `{task}` has a subtask with an empty id")]
    EmptySubtaskId { task: TaskId },
    #[error("task `{task}` has duplicate subtask id `{subtask}`")]
    DuplicateSubtaskId { task: TaskId, subtask: String },
    #[error("task `{0}` is pending but carries completed_at")]
    CompletedAtWhilePending(TaskId),
}

/// Canonical task record as delivered by the task repository.
///
/// All instants are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub deadline: i64,
    pub status: TaskStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Creates a pending task with a generated stable id.
    pub fn new(
        title: impl Into<String>,
        priority: Priority,
        deadline: i64,
        created_at: i64,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, priority, deadline, created_at)
    }

    /// Creates a pending task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        priority: Priority,
        deadline: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority,
            deadline,
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            tags: BTreeSet::new(),
            subtasks: Vec::new(),
        }
    }

    /// Checks record invariants before the task crosses a repository boundary.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle(self.id.clone()));
        }
        if self.status == TaskStatus::Pending && self.completed_at.is_some() {
            return Err(TaskValidationError::CompletedAtWhilePending(self.id.clone()));
        }

        let mut seen = BTreeSet::new();
        for subtask in &self.subtasks {
            if subtask.id.trim().is_empty() {
                return Err(TaskValidationError::EmptySubtaskId {
                    task: self.id.clone(),
                });
            }
            if !seen.insert(subtask.id.as_str()) {
                return Err(TaskValidationError::DuplicateSubtaskId {
                    task: self.id.clone(),
                    subtask: subtask.id.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Pending and past its deadline.
    pub fn is_overdue(&self, now: i64) -> bool {
        self.status == TaskStatus::Pending && self.deadline < now
    }

    /// Marks the task completed at `now`.
    ///
    /// Completing an already-completed task keeps the original `completed_at`.
    pub fn mark_completed(&mut self, now: i64) {
        if self.is_completed() {
            return;
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Reverts to pending and clears `completed_at`.
    pub fn revert_to_pending(&mut self) {
        self.status = TaskStatus::Pending;
        self.completed_at = None;
    }

    /// Flips completion state. Returns the new status.
    pub fn toggle_completed(&mut self, now: i64) -> TaskStatus {
        if self.is_completed() {
            self.revert_to_pending();
        } else {
            self.mark_completed(now);
        }
        self.status
    }

    /// Flips one subtask. Returns `false` if no subtask has `subtask_id`.
    pub fn toggle_subtask(&mut self, subtask_id: &str) -> bool {
        match self.subtasks.iter_mut().find(|item| item.id == subtask_id) {
            Some(subtask) => {
                subtask.is_completed = !subtask.is_completed;
                true
            }
            None => false,
        }
    }

    /// `(completed, total)` subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|item| item.is_completed).count();
        (done, self.subtasks.len())
    }

    /// Replaces tags with their normalized form.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
    }
}

/// Trims and lowercases tags, dropping empty values.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
