//! Per-task reminder and deadline notification scheduling.
//!
//! # Responsibility
//! - Compute trigger instants from a task deadline.
//! - Submit and cancel deferred notifications by deterministic id.
//!
//! # Invariants
//! - At most one reminder and one deadline trigger exist per task, because
//!   both are keyed by `TriggerKind::notification_id`.
//! - Triggers whose instant is not strictly after `now` are skipped.
//! - Completed tasks never get triggers.
//! - Public operations return `()`: delivery failures are logged and dropped
//!   so callers' task mutations never fail because of notifications.
//! - The scheduler keeps no local copy of scheduled state.

use crate::clock::{now_epoch_ms, MS_PER_HOUR, MS_PER_MINUTE};
use crate::config::NotificationConfig;
use crate::model::task::Task;
use crate::notify::delivery::{
    NotificationDelivery, NotificationPayload, TimestampTrigger, TriggerKind,
};
use futures::future::join_all;
use log::{debug, info, warn};

/// One trigger the scheduler would submit for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTrigger {
    pub kind: TriggerKind,
    pub payload: NotificationPayload,
    pub trigger: TimestampTrigger,
}

/// Best-effort scheduler over an external delivery service.
pub struct NotificationScheduler<D> {
    delivery: D,
    config: NotificationConfig,
}

impl<D: NotificationDelivery> NotificationScheduler<D> {
    pub fn new(delivery: D, config: NotificationConfig) -> Self {
        Self { delivery, config }
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Registers the configured channel. Failures are logged only.
    pub async fn setup_channel(&self) {
        match self.delivery.create_channel(&self.config.channel).await {
            Ok(channel_id) => info!(
                "event=channel_setup module=notify status=ok channel_id={channel_id}"
            ),
            Err(err) => warn!(
                "event=channel_setup module=notify status=error channel_id={} error={err}",
                self.config.channel.id
            ),
        }
    }

    /// Triggers `task` should own at `now`, without touching the service.
    pub fn plan(&self, task: &Task, now: i64) -> Vec<PlannedTrigger> {
        plan_triggers(task, now, &self.config)
    }

    /// Schedules reminder and deadline triggers against the current clock.
    pub async fn schedule_task_notifications(&self, task: &Task) {
        self.schedule_task_notifications_at(task, now_epoch_ms())
            .await;
    }

    /// Schedules reminder and deadline triggers relative to `now`.
    ///
    /// Not additive: callers rescheduling after a deadline change must
    /// cancel first.
    pub async fn schedule_task_notifications_at(&self, task: &Task, now: i64) {
        let granted = match self.delivery.request_permission().await {
            Ok(status) => status.is_granted(),
            Err(err) => {
                warn!(
                    "event=permission_request module=notify status=error task_id={} error={err}",
                    task.id
                );
                false
            }
        };
        if !granted {
            debug!(
                "event=schedule module=notify status=skipped task_id={} reason=permission",
                task.id
            );
            return;
        }

        let planned = self.plan(task, now);
        join_all(planned.iter().map(|item| self.submit(item))).await;
    }

    /// Cancels both trigger ids for `task_id`. Unknown ids are fine.
    pub async fn cancel_task_notifications(&self, task_id: &str) {
        let ids = TriggerKind::ALL.map(|kind| kind.notification_id(task_id));
        join_all(ids.iter().map(|id| self.cancel_one(id))).await;
    }

    async fn submit(&self, planned: &PlannedTrigger) {
        match self
            .delivery
            .create_trigger_notification(&planned.payload, &planned.trigger)
            .await
        {
            Ok(id) => info!(
                "event=trigger_submit module=notify status=ok notification_id={id} fire_at={} allow_while_idle={}",
                planned.trigger.timestamp, planned.trigger.allow_while_idle
            ),
            Err(err) => warn!(
                "event=trigger_submit module=notify status=error notification_id={} error={err}",
                planned.payload.id
            ),
        }
    }

    async fn cancel_one(&self, notification_id: &str) {
        if let Err(err) = self
            .delivery
            .cancel_trigger_notification(notification_id)
            .await
        {
            warn!(
                "event=trigger_cancel module=notify status=error notification_id={notification_id} error={err}"
            );
        }
    }
}

/// Triggers `task` should own at `now` under `config`.
///
/// Empty for completed tasks; instants not strictly after `now` are dropped.
pub fn plan_triggers(task: &Task, now: i64, config: &NotificationConfig) -> Vec<PlannedTrigger> {
    if task.is_completed() {
        return Vec::new();
    }

    TriggerKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let fire_at = fire_time(kind, task.deadline, config);
            if fire_at <= now {
                debug!(
                    "event=trigger_skip module=notify status=skipped task_id={} kind={} reason=past",
                    task.id,
                    kind.suffix()
                );
                return None;
            }
            Some(PlannedTrigger {
                kind,
                payload: payload(kind, task, config),
                trigger: TimestampTrigger {
                    timestamp: fire_at,
                    allow_while_idle: kind == TriggerKind::Deadline
                        && config.deadline_allow_while_idle,
                },
            })
        })
        .collect()
}

fn fire_time(kind: TriggerKind, deadline: i64, config: &NotificationConfig) -> i64 {
    match kind {
        TriggerKind::Reminder => deadline.saturating_sub(config.reminder_lead_ms),
        TriggerKind::Deadline => deadline,
    }
}

fn payload(kind: TriggerKind, task: &Task, config: &NotificationConfig) -> NotificationPayload {
    let (title, body) = match kind {
        TriggerKind::Reminder => (
            "Upcoming deadline".to_string(),
            format!(
                "\"{}\" is due in {}",
                task.title,
                describe_lead(config.reminder_lead_ms)
            ),
        ),
        TriggerKind::Deadline => (
            "Task due now".to_string(),
            format!("\"{}\" has reached its deadline", task.title),
        ),
    };
    NotificationPayload {
        id: kind.notification_id(&task.id),
        title,
        body,
        channel_id: config.channel.id.clone(),
        task_id: task.id.clone(),
    }
}

/// Human-readable lead time, in whole hours when exact.
pub fn describe_lead(lead_ms: i64) -> String {
    if lead_ms >= MS_PER_HOUR && lead_ms % MS_PER_HOUR == 0 {
        let hours = lead_ms / MS_PER_HOUR;
        return if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        };
    }
    let minutes = (lead_ms / MS_PER_MINUTE).max(1);
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}
