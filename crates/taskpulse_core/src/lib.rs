//! Core domain logic for TaskPulse.
//! This crate is the single source of truth for task ranking and
//! notification invariants.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod notify;
pub mod projection;
pub mod repo;
pub mod scoring;
pub mod service;

pub use clock::now_epoch_ms;
pub use config::{
    ChannelConfig, ChannelImportance, ConfigError, EngineConfig, NotificationConfig,
};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{
    normalize_tags, Priority, Subtask, Task, TaskId, TaskStatus, TaskValidationError,
};
pub use notify::delivery::{
    DeliveryError, NotificationDelivery, NotificationPayload, PermissionStatus, TimestampTrigger,
    TriggerKind,
};
pub use notify::memory::{DeliveryCall, InMemoryDelivery, PendingTrigger};
pub use notify::scheduler::{plan_triggers, NotificationScheduler, PlannedTrigger};
pub use projection::{
    project_ranked_view, RankedView, RankedViewProjector, ScoredTask, TaskCollection,
};
pub use repo::task_repo::{InMemoryTaskRepository, RepoError, RepoResult, TaskRepository};
pub use scoring::{
    classify_deadline_outcome, compute_consistency_score, compute_score, compute_time_health,
    DeadlineOutcome,
};
pub use service::task_service::{NotificationAction, TaskService, TaskTransition};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
