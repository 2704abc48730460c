//! Notification delivery service contract.
//!
//! # Responsibility
//! - Describe the external service that stores and fires deferred local
//!   notifications, including while the device is suspended.
//! - Define the payload/trigger shapes and the deterministic trigger ids.
//!
//! # Invariants
//! - `create_trigger_notification` upserts by `payload.id`.
//! - Cancelling an unknown or already-fired id succeeds.
//! - Trigger ids are `{task_id}-reminder` and `{task_id}-deadline`.

use crate::config::ChannelConfig;
use crate::model::task::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a delivery service implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("delivery service rejected request: {0}")]
    Rejected(String),
    #[error("delivery service unavailable: {0}")]
    Unavailable(String),
}

/// Device-level notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Authorized,
    Provisional,
    Denied,
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }
}

/// The two independent timers each task can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Reminder,
    Deadline,
}

impl TriggerKind {
    pub const ALL: [Self; 2] = [Self::Reminder, Self::Deadline];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Deadline => "deadline",
        }
    }

    /// Deterministic delivery-service id for this timer of `task_id`.
    pub fn notification_id(self, task_id: &str) -> String {
        format!("{task_id}-{}", self.suffix())
    }
}

/// Visible notification content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub id: String,
    pub title: String,
    pub body: String,
    pub channel_id: String,
    /// Task the notification opens when tapped.
    pub task_id: TaskId,
}

/// Absolute fire instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampTrigger {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Best-effort firing while the host is in a low-power suspended state.
    pub allow_while_idle: bool,
}

/// External notification delivery service.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, DeliveryError>;

    /// One-time channel registration. Returns the channel id.
    async fn create_channel(&self, channel: &ChannelConfig) -> Result<String, DeliveryError>;

    /// Creates or replaces the trigger keyed by `payload.id`. Returns that id.
    async fn create_trigger_notification(
        &self,
        payload: &NotificationPayload,
        trigger: &TimestampTrigger,
    ) -> Result<String, DeliveryError>;

    async fn cancel_trigger_notification(&self, notification_id: &str)
        -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T> NotificationDelivery for Arc<T>
where
    T: NotificationDelivery + ?Sized,
{
    async fn request_permission(&self) -> Result<PermissionStatus, DeliveryError> {
        (**self).request_permission().await
    }

    async fn create_channel(&self, channel: &ChannelConfig) -> Result<String, DeliveryError> {
        (**self).create_channel(channel).await
    }

    async fn create_trigger_notification(
        &self,
        payload: &NotificationPayload,
        trigger: &TimestampTrigger,
    ) -> Result<String, DeliveryError> {
        (**self).create_trigger_notification(payload, trigger).await
    }

    async fn cancel_trigger_notification(
        &self,
        notification_id: &str,
    ) -> Result<(), DeliveryError> {
        (**self).cancel_trigger_notification(notification_id).await
    }
}
