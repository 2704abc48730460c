//! Task mutation handlers.
//!
//! # Responsibility
//! - Persist task mutations through a `TaskRepository`.
//! - Keep device notifications in step with each mutation.
//! - Serve the ranked view of the current repository snapshot.
//!
//! # Invariants
//! - The repository write happens first; notifications follow and can never
//!   turn a successful write into an error.
//! - Deadline-affecting edits always cancel before scheduling again.
//! - `created_at` is never changed by an update.

use crate::model::task::{Task, TaskStatus};
use crate::notify::delivery::NotificationDelivery;
use crate::notify::scheduler::NotificationScheduler;
use crate::projection::{RankedView, RankedViewProjector};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use log::info;
use std::sync::Arc;

/// Lifecycle change between two observed states of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTransition {
    Created,
    Edited,
    Completed,
    Reverted,
    Deleted,
    Unchanged,
}

/// What the scheduler must do for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Schedule,
    CancelThenSchedule,
    Cancel,
    Nothing,
}

impl TaskTransition {
    /// Classifies a mutation from its before/after states.
    ///
    /// Only deadline, title and description edits count as `Edited`; tag and
    /// subtask edits leave notifications alone.
    pub fn between(previous: Option<&Task>, next: Option<&Task>) -> Self {
        match (previous, next) {
            (None, Some(_)) => Self::Created,
            (Some(_), None) => Self::Deleted,
            (None, None) => Self::Unchanged,
            (Some(before), Some(after)) if before.status != after.status => {
                match after.status {
                    TaskStatus::Completed => Self::Completed,
                    TaskStatus::Pending => Self::Reverted,
                }
            }
            (Some(before), Some(after)) => {
                let edited = before.deadline != after.deadline
                    || before.title != after.title
                    || before.description != after.description;
                if edited {
                    Self::Edited
                } else {
                    Self::Unchanged
                }
            }
        }
    }

    pub fn notification_action(self) -> NotificationAction {
        match self {
            Self::Created | Self::Reverted => NotificationAction::Schedule,
            Self::Edited => NotificationAction::CancelThenSchedule,
            Self::Completed | Self::Deleted => NotificationAction::Cancel,
            Self::Unchanged => NotificationAction::Nothing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Completed => "completed",
            Self::Reverted => "reverted",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Mutation-handling facade over a repository and a notification scheduler.
pub struct TaskService<R: TaskRepository, D: NotificationDelivery> {
    repo: R,
    scheduler: NotificationScheduler<D>,
    projector: RankedViewProjector,
}

impl<R: TaskRepository, D: NotificationDelivery> TaskService<R, D> {
    pub fn new(repo: R, scheduler: NotificationScheduler<D>) -> Self {
        Self {
            repo,
            scheduler,
            projector: RankedViewProjector::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn scheduler(&self) -> &NotificationScheduler<D> {
        &self.scheduler
    }

    /// Inserts a new task and schedules its notifications.
    pub async fn create_task(&self, task: Task, now: i64) -> RepoResult<Task> {
        self.repo.insert(task.clone())?;
        self.sync_notifications(TaskTransition::Created, &task, now)
            .await;
        Ok(task)
    }

    /// Replaces a task, keeping its stored `created_at`.
    pub async fn update_task(&self, mut task: Task, now: i64) -> RepoResult<Task> {
        let previous = self
            .repo
            .get(&task.id)
            .ok_or_else(|| RepoError::NotFound(task.id.clone()))?;
        task.created_at = previous.created_at;
        self.repo.update(task.clone())?;

        let transition = TaskTransition::between(Some(&previous), Some(&task));
        self.sync_notifications(transition, &task, now).await;
        Ok(task)
    }

    /// Sets completion state; completing stamps `completed_at = now`.
    pub async fn set_completed(&self, id: &str, completed: bool, now: i64) -> RepoResult<Task> {
        let mut task = self
            .repo
            .get(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        if completed {
            task.mark_completed(now);
        } else {
            task.revert_to_pending();
        }
        self.update_task(task, now).await
    }

    pub async fn toggle_completed(&self, id: &str, now: i64) -> RepoResult<Task> {
        let completed = self
            .repo
            .get(id)
            .map(|task| task.is_completed())
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        self.set_completed(id, !completed, now).await
    }

    pub async fn toggle_subtask(&self, id: &str, subtask_id: &str, now: i64) -> RepoResult<Task> {
        let mut task = self
            .repo
            .get(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        if !task.toggle_subtask(subtask_id) {
            return Err(RepoError::SubtaskNotFound {
                task: id.to_string(),
                subtask: subtask_id.to_string(),
            });
        }
        self.update_task(task, now).await
    }

    /// Removes a task and cancels its notifications.
    pub async fn delete_task(&self, id: &str, now: i64) -> RepoResult<Task> {
        let removed = self.repo.remove(id)?;
        self.sync_notifications(TaskTransition::Deleted, &removed, now)
            .await;
        Ok(removed)
    }

    /// Ranked view of the current snapshot, memoized on snapshot identity.
    pub fn ranked_view(&mut self, now: i64) -> Arc<RankedView> {
        let snapshot = self.repo.snapshot();
        self.projector.view(&snapshot, now)
    }

    async fn sync_notifications(&self, transition: TaskTransition, task: &Task, now: i64) {
        let action = transition.notification_action();
        info!(
            "event=task_mutation module=service status=ok task_id={} transition={}",
            task.id,
            transition.as_str()
        );
        match action {
            NotificationAction::Schedule => {
                self.scheduler
                    .schedule_task_notifications_at(task, now)
                    .await;
            }
            NotificationAction::CancelThenSchedule => {
                self.scheduler.cancel_task_notifications(&task.id).await;
                self.scheduler
                    .schedule_task_notifications_at(task, now)
                    .await;
            }
            NotificationAction::Cancel => {
                self.scheduler.cancel_task_notifications(&task.id).await;
            }
            NotificationAction::Nothing => {}
        }
    }
}
