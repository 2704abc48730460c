//! Urgency, consistency and time-health scores.
//!
//! # Responsibility
//! - Turn task attributes plus an explicit `now` into derived numbers.
//!
//! # Invariants
//! - Every function is pure and total; no input makes them fail or panic.
//! - Completed tasks always score `0.0` urgency.
//! - Overdue pending tasks use a fixed `OVERDUE_FLOOR_HOURS`, so every overdue
//!   task of one tier scores the same no matter how late it is.
//! - Consistency and time health stay within `0..=100`.

use crate::clock::MS_PER_HOUR;
use crate::model::task::{Task, TaskStatus};

/// Hours-remaining value used once a deadline has passed.
pub const OVERDUE_FLOOR_HOURS: f64 = 0.01;
/// Multiplier applied to inverse hours remaining.
pub const URGENCY_MULTIPLIER: f64 = 50.0;

/// Urgency score: priority weight plus inverse-time urgency.
///
/// Returns `0.0` for completed tasks so they sink in a descending sort.
pub fn compute_score(task: &Task, now: i64) -> f64 {
    if task.status == TaskStatus::Completed {
        return 0.0;
    }

    let hours = hours_remaining(task.deadline, now);
    let urgency = (1.0 / hours) * URGENCY_MULTIPLIER;
    task.priority.weight() + urgency
}

fn hours_remaining(deadline: i64, now: i64) -> f64 {
    let hours = deadline.saturating_sub(now) as f64 / MS_PER_HOUR as f64;
    if hours > 0.0 {
        hours
    } else {
        OVERDUE_FLOOR_HOURS
    }
}

/// How one task counts toward the consistency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome {
    OnTime,
    Late,
    Overdue,
    /// Pending and not yet due; excluded from the score.
    Open,
}

/// Classifies a task into exactly one consistency bucket.
pub fn classify_deadline_outcome(task: &Task, now: i64) -> DeadlineOutcome {
    match task.status {
        TaskStatus::Completed => match task.completed_at {
            Some(completed_at) if completed_at <= task.deadline => DeadlineOutcome::OnTime,
            _ => DeadlineOutcome::Late,
        },
        TaskStatus::Pending if task.is_overdue(now) => DeadlineOutcome::Overdue,
        TaskStatus::Pending => DeadlineOutcome::Open,
    }
}

/// Percentage of decided tasks completed on or before their deadline.
///
/// Returns `0` when nothing has been decided yet.
pub fn compute_consistency_score(tasks: &[Task], now: i64) -> u8 {
    let mut on_time = 0_u64;
    let mut decided = 0_u64;
    for task in tasks {
        match classify_deadline_outcome(task, now) {
            DeadlineOutcome::OnTime => {
                on_time += 1;
                decided += 1;
            }
            DeadlineOutcome::Late | DeadlineOutcome::Overdue => decided += 1,
            DeadlineOutcome::Open => {}
        }
    }

    if decided == 0 {
        return 0;
    }
    percent(on_time as f64 / decided as f64)
}

/// Share of the allotted `created_at -> deadline` span still remaining.
///
/// Completed tasks report `100` when finished on time and `0` otherwise.
/// A zero or negative span reports `0`.
pub fn compute_time_health(task: &Task, now: i64) -> u8 {
    if task.status == TaskStatus::Completed {
        return match classify_deadline_outcome(task, now) {
            DeadlineOutcome::OnTime => 100,
            _ => 0,
        };
    }

    if task.deadline <= task.created_at {
        return 0;
    }

    let total = task.deadline.saturating_sub(task.created_at) as f64;
    let remaining = task.deadline.saturating_sub(now) as f64;
    percent(remaining / total)
}

fn percent(ratio: f64) -> u8 {
    // Clamped to 0..=100 before the cast.
    (ratio * 100.0).clamp(0.0, 100.0).round() as u8
}
