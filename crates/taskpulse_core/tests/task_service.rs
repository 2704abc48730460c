use std::sync::Arc;
use taskpulse_core::{
    DeliveryCall, InMemoryDelivery, InMemoryTaskRepository, NotificationConfig,
    NotificationScheduler, Priority, RepoError, Subtask, Task, TaskRepository, TaskService,
    TaskStatus,
};

const HOUR: i64 = 3_600_000;
const NOW: i64 = 1_700_000_000_000;

type Service = TaskService<InMemoryTaskRepository, Arc<InMemoryDelivery>>;

fn service_with(delivery: Arc<InMemoryDelivery>) -> Service {
    let scheduler = NotificationScheduler::new(delivery, NotificationConfig::default());
    TaskService::new(InMemoryTaskRepository::new(), scheduler)
}

fn future_task(id: &str) -> Task {
    Task::with_id(id, "ship", Priority::High, NOW + 5 * HOUR, NOW)
}

#[tokio::test]
async fn create_schedules_both_timers() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));

    service.create_task(future_task("t1"), NOW).await.unwrap();

    assert_eq!(service.repo().snapshot().len(), 1);
    assert_eq!(
        delivery.pending_ids(),
        vec!["t1-deadline".to_string(), "t1-reminder".to_string()]
    );
}

#[tokio::test]
async fn deadline_edit_cancels_before_rescheduling() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));
    let mut task = service.create_task(future_task("t1"), NOW).await.unwrap();
    let calls_before = delivery.calls().len();

    task.deadline = NOW + 9 * HOUR;
    task.created_at = 0;
    let updated = service.update_task(task, NOW).await.unwrap();

    assert_eq!(updated.created_at, NOW, "created_at must not change");
    let calls = delivery.calls()[calls_before..].to_vec();
    assert_eq!(
        &calls[..2],
        &[
            DeliveryCall::Cancel("t1-reminder".to_string()),
            DeliveryCall::Cancel("t1-deadline".to_string()),
        ]
    );
    assert_eq!(
        delivery.pending("t1-deadline").unwrap().trigger.timestamp,
        NOW + 9 * HOUR
    );
    assert_eq!(delivery.pending_ids().len(), 2);
}

#[tokio::test]
async fn completion_cancels_and_revert_reschedules() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));
    service.create_task(future_task("t1"), NOW).await.unwrap();

    let done = service.set_completed("t1", true, NOW + HOUR).await.unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completed_at, Some(NOW + HOUR));
    assert!(delivery.pending_ids().is_empty());

    let reopened = service.toggle_completed("t1", NOW + 2 * HOUR).await.unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(delivery.pending_ids().len(), 2);
}

#[tokio::test]
async fn revert_after_reminder_window_only_schedules_deadline() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));
    service.create_task(future_task("t1"), NOW).await.unwrap();
    service.set_completed("t1", true, NOW).await.unwrap();

    service
        .set_completed("t1", false, NOW + 4 * HOUR + 30 * 60_000)
        .await
        .unwrap();

    assert_eq!(delivery.pending_ids(), vec!["t1-deadline".to_string()]);
}

#[tokio::test]
async fn delete_cancels_notifications() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));
    service.create_task(future_task("t1"), NOW).await.unwrap();

    service.delete_task("t1", NOW).await.unwrap();

    assert!(service.repo().get("t1").is_none());
    assert!(delivery.pending_ids().is_empty());
}

#[tokio::test]
async fn subtask_toggle_leaves_notifications_alone() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let service = service_with(Arc::clone(&delivery));
    let mut task = future_task("t1");
    task.subtasks.push(Subtask::new("draft"));
    let subtask_id = task.subtasks[0].id.clone();
    service.create_task(task, NOW).await.unwrap();
    let calls_before = delivery.calls().len();

    let updated = service.toggle_subtask("t1", &subtask_id, NOW).await.unwrap();
    assert_eq!(updated.subtask_progress(), (1, 1));
    assert_eq!(delivery.calls().len(), calls_before);

    let err = service.toggle_subtask("t1", "missing", NOW).await.unwrap_err();
    assert!(matches!(err, RepoError::SubtaskNotFound { .. }));
}

#[tokio::test]
async fn delivery_outage_never_fails_mutations() {
    let delivery = Arc::new(InMemoryDelivery::new());
    delivery.set_unavailable(true);
    let service = service_with(Arc::clone(&delivery));

    service.create_task(future_task("t1"), NOW).await.unwrap();
    service.set_completed("t1", true, NOW).await.unwrap();
    service.delete_task("t1", NOW).await.unwrap();

    assert!(service.repo().snapshot().is_empty());
}

#[tokio::test]
async fn ranked_view_tracks_repository_mutations() {
    let delivery = Arc::new(InMemoryDelivery::new());
    let mut service = service_with(delivery);
    service.create_task(future_task("a"), NOW).await.unwrap();

    let first = service.ranked_view(NOW);
    let cached = service.ranked_view(NOW + HOUR);
    assert!(Arc::ptr_eq(&first, &cached));

    let overdue = Task::with_id("b", "late", Priority::Low, NOW - HOUR, NOW - 2 * HOUR);
    service.create_task(overdue, NOW).await.unwrap();
    let next = service.ranked_view(NOW);
    assert_eq!(next.ranked[0].task.id, "b");
    assert_eq!(next.pending.len(), 2);
    assert_eq!(next.consistency_score, 0);
}

#[tokio::test]
async fn missing_task_mutations_return_not_found() {
    let service = service_with(Arc::new(InMemoryDelivery::new()));

    let err = service.set_completed("ghost", true, NOW).await.unwrap_err();
    assert_eq!(err, RepoError::NotFound("ghost".to_string()));
    let err = service.delete_task("ghost", NOW).await.unwrap_err();
    assert_eq!(err, RepoError::NotFound("ghost".to_string()));
}
