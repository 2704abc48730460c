//! Engine configuration.
//!
//! # Responsibility
//! - Hold notification scheduling settings that hosts may override.
//! - Parse and validate JSON configuration payloads.
//!
//! # Invariants
//! - Missing fields fall back to `Default` values.
//! - `reminder_lead_ms` is always strictly positive after validation.
//! - Scoring constants are fixed and are not configurable here.

use crate::clock::MS_PER_HOUR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CHANNEL_ID: &str = "task-reminders";
pub const DEFAULT_CHANNEL_NAME: &str = "Task Reminders";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Delivery-side importance of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelImportance {
    Low,
    Default,
    High,
}

/// One-time notification channel setup payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: DEFAULT_CHANNEL_NAME.to_string(),
            importance: ChannelImportance::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel: ChannelConfig,
    /// How long before the deadline the reminder fires.
    pub reminder_lead_ms: i64,
    /// Request suspended-state delivery for the deadline trigger.
    pub deadline_allow_while_idle: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            reminder_lead_ms: MS_PER_HOUR,
            deadline_allow_while_idle: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub notifications: NotificationConfig,
}

impl EngineConfig {
    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed JSON or wrong field types.
    /// - `ConfigError::Invalid` for out-of-range values.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let notifications = &self.notifications;
        if notifications.reminder_lead_ms <= 0 {
            return Err(ConfigError::Invalid(format!(
                "reminder_lead_ms must be > 0, got {}",
                notifications.reminder_lead_ms
            )));
        }
        if notifications.channel.id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "notifications.channel.id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
