//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose scoring, ranking and trigger planning to Dart via FRB.
//! - Convert plain FFI records into validated core tasks.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Invalid task records produce an error envelope, never a partial result.
//! - `now_ms = None` means "use the device clock".

use log::warn;
use taskpulse_core::{
    compute_score, compute_time_health, core_version as core_version_inner,
    init_logging as init_logging_inner, now_epoch_ms, plan_triggers, project_ranked_view,
    EngineConfig, Priority, ScoredTask, Subtask, Task, TaskStatus, TriggerKind,
};

/// Subtask record as sent from Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiSubtask {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
}

/// Task record as sent from Dart. Instants are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiTask {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `LOW|MEDIUM|HIGH`, case-insensitive.
    pub priority: String,
    pub deadline_ms: i64,
    /// `PENDING|COMPLETED`, case-insensitive.
    pub status: String,
    pub created_at_ms: i64,
    pub completed_at_ms: Option<i64>,
    pub tags: Vec<String>,
    pub subtasks: Vec<FfiSubtask>,
}

/// Derived values for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct FfiTaskMetrics {
    pub task_id: String,
    pub score: f64,
    pub time_health: u8,
    pub is_completed: bool,
}

/// Ranked view envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTasksResponse {
    pub ok: bool,
    pub message: String,
    /// Every task, descending by score.
    pub ranked: Vec<FfiTaskMetrics>,
    /// Pending ids in ranked order.
    pub pending_ids: Vec<String>,
    /// Completed ids in ranked order.
    pub completed_ids: Vec<String>,
    pub consistency_score: u8,
}

impl RankedTasksResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            ranked: Vec::new(),
            pending_ids: Vec::new(),
            completed_ids: Vec::new(),
            consistency_score: 0,
        }
    }
}

/// One trigger Dart should hand to the device notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiPlannedTrigger {
    pub notification_id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub channel_id: String,
    pub fire_at_ms: i64,
    pub allow_while_idle: bool,
}

/// Trigger plan envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPlanResponse {
    pub ok: bool,
    pub message: String,
    pub triggers: Vec<FfiPlannedTrigger>,
}

impl TriggerPlanResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            triggers: Vec::new(),
        }
    }
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may create `log_dir`.
/// - Same `level + log_dir` is idempotent; reconfiguration returns an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Ranks tasks by urgency and reports the consistency score.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Never panics; one invalid record fails the whole call.
#[flutter_rust_bridge::frb(sync)]
pub fn rank_tasks(tasks: Vec<FfiTask>, now_ms: Option<i64>) -> RankedTasksResponse {
    let now = now_ms.unwrap_or_else(now_epoch_ms);
    let tasks = match convert_tasks(tasks) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!("event=rank_tasks module=ffi status=error error={err}");
            return RankedTasksResponse::failure(format!("rank_tasks failed: {err}"));
        }
    };

    let view = project_ranked_view(&tasks, now);
    RankedTasksResponse {
        ok: true,
        message: format!("Ranked {} task(s).", view.ranked.len()),
        ranked: view
            .ranked
            .iter()
            .map(|item| to_metrics(item, now))
            .collect(),
        pending_ids: ids(&view.pending),
        completed_ids: ids(&view.completed),
        consistency_score: view.consistency_score,
    }
}

/// Scores one task. Returns `None` for an invalid record.
#[flutter_rust_bridge::frb(sync)]
pub fn task_metrics(task: FfiTask, now_ms: Option<i64>) -> Option<FfiTaskMetrics> {
    let now = now_ms.unwrap_or_else(now_epoch_ms);
    let task = convert_task(task).ok()?;
    Some(FfiTaskMetrics {
        task_id: task.id.clone(),
        score: compute_score(&task, now),
        time_health: compute_time_health(&task, now),
        is_completed: task.is_completed(),
    })
}

/// Consistency score over `tasks`; `0` for invalid input or no history.
#[flutter_rust_bridge::frb(sync)]
pub fn consistency_score(tasks: Vec<FfiTask>, now_ms: Option<i64>) -> u8 {
    let now = now_ms.unwrap_or_else(now_epoch_ms);
    convert_tasks(tasks)
        .map(|tasks| project_ranked_view(&tasks, now).consistency_score)
        .unwrap_or(0)
}

/// Triggers the device should hold for `task`.
///
/// `config_json` is an engine configuration document; `None` uses defaults.
/// Dart cancels `notification_ids(task.id)` before submitting these when a
/// deadline changes.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_task_triggers(
    task: FfiTask,
    now_ms: Option<i64>,
    config_json: Option<String>,
) -> TriggerPlanResponse {
    let now = now_ms.unwrap_or_else(now_epoch_ms);
    let config = match config_json.as_deref().map(EngineConfig::from_json_str) {
        None => EngineConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            warn!("event=plan_task_triggers module=ffi status=error error={err}");
            return TriggerPlanResponse::failure(format!("plan_task_triggers failed: {err}"));
        }
    };
    let task = match convert_task(task) {
        Ok(task) => task,
        Err(err) => {
            warn!("event=plan_task_triggers module=ffi status=error error={err}");
            return TriggerPlanResponse::failure(format!("plan_task_triggers failed: {err}"));
        }
    };

    let triggers = plan_triggers(&task, now, &config.notifications)
        .into_iter()
        .map(|planned| FfiPlannedTrigger {
            notification_id: planned.payload.id,
            kind: planned.kind.suffix().to_string(),
            title: planned.payload.title,
            body: planned.payload.body,
            channel_id: planned.payload.channel_id,
            fire_at_ms: planned.trigger.timestamp,
            allow_while_idle: planned.trigger.allow_while_idle,
        })
        .collect::<Vec<_>>();
    TriggerPlanResponse {
        ok: true,
        message: format!("Planned {} trigger(s).", triggers.len()),
        triggers,
    }
}

/// Deterministic notification ids owned by `task_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_ids(task_id: String) -> Vec<String> {
    TriggerKind::ALL
        .iter()
        .map(|kind| kind.notification_id(&task_id))
        .collect()
}

fn convert_tasks(tasks: Vec<FfiTask>) -> Result<Vec<Task>, String> {
    tasks.into_iter().map(convert_task).collect()
}

fn convert_task(raw: FfiTask) -> Result<Task, String> {
    let priority = match raw.priority.trim().to_ascii_uppercase().as_str() {
        "LOW" => Priority::Low,
        "MEDIUM" => Priority::Medium,
        "HIGH" => Priority::High,
        other => return Err(format!("unsupported priority `{other}` for task {}", raw.id)),
    };
    let status = match raw.status.trim().to_ascii_uppercase().as_str() {
        "PENDING" => TaskStatus::Pending,
        "COMPLETED" => TaskStatus::Completed,
        other => return Err(format!("unsupported status `{other}` for task {}", raw.id)),
    };

    let mut task = Task::with_id(raw.id, raw.title, priority, raw.deadline_ms, raw.created_at_ms);
    task.description = raw.description;
    task.status = status;
    task.completed_at = match status {
        TaskStatus::Completed => raw.completed_at_ms,
        TaskStatus::Pending => None,
    };
    task.set_tags(raw.tags);
    task.subtasks = raw
        .subtasks
        .into_iter()
        .map(|item| Subtask {
            id: item.id,
            title: item.title,
            is_completed: item.is_completed,
        })
        .collect();

    task.validate().map_err(|err| err.to_string())?;
    Ok(task)
}

fn to_metrics(item: &ScoredTask, now: i64) -> FfiTaskMetrics {
    FfiTaskMetrics {
        task_id: item.task.id.clone(),
        score: item.score,
        time_health: compute_time_health(&item.task, now),
        is_completed: item.task.is_completed(),
    }
}

fn ids(items: &[ScoredTask]) -> Vec<String> {
    items.iter().map(|item| item.task.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        consistency_score, notification_ids, plan_task_triggers, rank_tasks, task_metrics, FfiTask,
    };

    const HOUR: i64 = 3_600_000;
    const NOW: i64 = 1_700_000_000_000;

    fn ffi_task(id: &str, priority: &str, deadline_ms: i64) -> FfiTask {
        FfiTask {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            priority: priority.to_string(),
            deadline_ms,
            status: "pending".to_string(),
            created_at_ms: NOW - HOUR,
            completed_at_ms: None,
            tags: vec!["Work".to_string()],
            subtasks: Vec::new(),
        }
    }

    #[test]
    fn rank_tasks_orders_overdue_first() {
        let response = rank_tasks(
            vec![
                ffi_task("soon", "high", NOW + 3 * HOUR),
                ffi_task("late", "low", NOW - HOUR),
            ],
            Some(NOW),
        );

        assert!(response.ok, "{}", response.message);
        assert_eq!(response.pending_ids, vec!["late", "soon"]);
        assert!((response.ranked[0].score - 5010.0).abs() < 1e-9);
        assert_eq!(response.consistency_score, 0);
    }

    #[test]
    fn invalid_priority_fails_whole_call() {
        let response = rank_tasks(vec![ffi_task("a", "urgent", NOW)], Some(NOW));
        assert!(!response.ok);
        assert!(response.message.contains("unsupported priority"));
        assert!(task_metrics(ffi_task("a", "urgent", NOW), Some(NOW)).is_none());
        assert_eq!(consistency_score(vec![ffi_task("a", "urgent", NOW)], Some(NOW)), 0);
    }

    #[test]
    fn plan_task_triggers_skips_past_reminder() {
        let response = plan_task_triggers(ffi_task("a", "medium", NOW + HOUR / 2), Some(NOW), None);
        assert!(response.ok);
        assert_eq!(response.triggers.len(), 1);
        assert_eq!(response.triggers[0].notification_id, "a-deadline");
        assert!(response.triggers[0].allow_while_idle);
    }

    #[test]
    fn plan_task_triggers_honors_config_json() {
        let config = r#"{"notifications":{"reminder_lead_ms":900000,"channel":{"id":"focus"}}}"#;
        let response = plan_task_triggers(
            ffi_task("a", "medium", NOW + HOUR / 2),
            Some(NOW),
            Some(config.to_string()),
        );

        assert!(response.ok, "{}", response.message);
        assert_eq!(response.triggers.len(), 2);
        let reminder = &response.triggers[0];
        assert_eq!(reminder.notification_id, "a-reminder");
        assert_eq!(reminder.fire_at_ms, NOW + HOUR / 2 - 900_000);
        assert_eq!(reminder.channel_id, "focus");
        assert!(reminder.body.contains("15 minutes"));
    }

    #[test]
    fn plan_task_triggers_rejects_invalid_config() {
        let response = plan_task_triggers(
            ffi_task("a", "medium", NOW + HOUR),
            Some(NOW),
            Some(r#"{"notifications":{"reminder_lead_ms":0}}"#.to_string()),
        );
        assert!(!response.ok);
        assert!(response.triggers.is_empty());
    }

    #[test]
    fn notification_ids_cover_both_timers() {
        assert_eq!(
            notification_ids("a".to_string()),
            vec!["a-reminder".to_string(), "a-deadline".to_string()]
        );
    }
}
