//! In-process delivery service.
//!
//! Keeps pending triggers in a map keyed by notification id, with the same
//! upsert/cancel semantics as a device notification service. Used by the CLI
//! dry run and by tests, which can also inject denials and failures.

use crate::config::ChannelConfig;
use crate::notify::delivery::{
    DeliveryError, NotificationDelivery, NotificationPayload, PermissionStatus, TimestampTrigger,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One call received by the delivery service, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryCall {
    RequestPermission,
    CreateChannel(String),
    Create(String),
    Cancel(String),
}

/// A trigger currently waiting to fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTrigger {
    pub payload: NotificationPayload,
    pub trigger: TimestampTrigger,
}

struct State {
    permission: PermissionStatus,
    unavailable: bool,
    failing_ids: BTreeSet<String>,
    channels: BTreeMap<String, ChannelConfig>,
    pending: BTreeMap<String, PendingTrigger>,
    calls: Vec<DeliveryCall>,
}

pub struct InMemoryDelivery {
    state: Mutex<State>,
}

impl InMemoryDelivery {
    /// Creates a service that grants permission.
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Authorized)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            state: Mutex::new(State {
                permission,
                unavailable: false,
                failing_ids: BTreeSet::new(),
                channels: BTreeMap::new(),
                pending: BTreeMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        self.lock().permission = permission;
    }

    /// Makes every call fail with `DeliveryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Makes create/cancel for these notification ids fail.
    pub fn fail_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .failing_ids
            .extend(ids.into_iter().map(Into::into));
    }

    /// Pending notification ids, sorted.
    pub fn pending_ids(&self) -> Vec<String> {
        self.lock().pending.keys().cloned().collect()
    }

    pub fn pending(&self, notification_id: &str) -> Option<PendingTrigger> {
        self.lock().pending.get(notification_id).cloned()
    }

    pub fn pending_triggers(&self) -> Vec<PendingTrigger> {
        self.lock().pending.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<DeliveryCall> {
        self.lock().calls.clone()
    }

    pub fn channel(&self, channel_id: &str) -> Option<ChannelConfig> {
        self.lock().channels.get(channel_id).cloned()
    }

    /// Removes and returns triggers due at or before `now`, as if they fired.
    pub fn fire_due(&self, now: i64) -> Vec<PendingTrigger> {
        let mut state = self.lock();
        let due = state
            .pending
            .iter()
            .filter(|(_, item)| item.trigger.timestamp <= now)
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        due.iter()
            .filter_map(|id| state.pending.remove(id))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryDelivery {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn check(&self, id: Option<&str>) -> Result<(), DeliveryError> {
        if self.unavailable {
            return Err(DeliveryError::Unavailable("service offline".to_string()));
        }
        match id {
            Some(id) if self.failing_ids.contains(id) => {
                Err(DeliveryError::Rejected(format!("injected failure for `{id}`")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl NotificationDelivery for InMemoryDelivery {
    async fn request_permission(&self) -> Result<PermissionStatus, DeliveryError> {
        let mut state = self.lock();
        state.calls.push(DeliveryCall::RequestPermission);
        state.check(None)?;
        Ok(state.permission)
    }

    async fn create_channel(&self, channel: &ChannelConfig) -> Result<String, DeliveryError> {
        let mut state = self.lock();
        state.calls.push(DeliveryCall::CreateChannel(channel.id.clone()));
        state.check(None)?;
        state.channels.insert(channel.id.clone(), channel.clone());
        Ok(channel.id.clone())
    }

    async fn create_trigger_notification(
        &self,
        payload: &NotificationPayload,
        trigger: &TimestampTrigger,
    ) -> Result<String, DeliveryError> {
        let mut state = self.lock();
        state.calls.push(DeliveryCall::Create(payload.id.clone()));
        state.check(Some(payload.id.as_str()))?;
        state.pending.insert(
            payload.id.clone(),
            PendingTrigger {
                payload: payload.clone(),
                trigger: *trigger,
            },
        );
        Ok(payload.id.clone())
    }

    async fn cancel_trigger_notification(
        &self,
        notification_id: &str,
    ) -> Result<(), DeliveryError> {
        let mut state = self.lock();
        state
            .calls
            .push(DeliveryCall::Cancel(notification_id.to_string()));
        state.check(Some(notification_id))?;
        state.pending.remove(notification_id);
        Ok(())
    }
}
