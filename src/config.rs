// Copyright (c) 2025 - Cowboy AI, Inc.
//! Destroy session configuration

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// Default wait for a stream error before checking again
pub const DEFAULT_ERROR_POLL_TIMEOUT_MS: u64 = 1_000;

/// Finish events this much older than the stream are ignored on a fresh stream
pub const DEFAULT_STALE_FINISH_THRESHOLD_SECS: i64 = 10;

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for one destroy session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,

    /// Staged changeset to destroy with
    pub changeset_id: Option<String>,

    /// Destroy even when resources are in an unexpected state
    pub force: bool,

    pub error_poll_timeout_ms: u64,
    pub stale_finish_threshold_secs: i64,
    pub event_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instance_id: None,
            instance_name: None,
            changeset_id: None,
            force: false,
            error_poll_timeout_ms: DEFAULT_ERROR_POLL_TIMEOUT_MS,
            stale_finish_threshold_secs: DEFAULT_STALE_FINISH_THRESHOLD_SECS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Configuration for the instance with the given ID
    pub fn for_instance(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            ..Default::default()
        }
    }

    pub fn with_instance_name(mut self, instance_name: impl Into<String>) -> Self {
        self.instance_name = Some(instance_name.into());
        self
    }

    pub fn with_changeset(mut self, changeset_id: impl Into<String>) -> Self {
        self.changeset_id = Some(changeset_id.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_error_poll_timeout(mut self, timeout: Duration) -> Self {
        self.error_poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let force = match non_empty("DESTROY_FORCE") {
            Some(value) => parse_bool("DESTROY_FORCE", &value)?,
            None => false,
        };
        let error_poll_timeout_ms = match non_empty("DESTROY_ERROR_POLL_TIMEOUT_MS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "DESTROY_ERROR_POLL_TIMEOUT_MS".to_string(),
                value,
            })?,
            None => DEFAULT_ERROR_POLL_TIMEOUT_MS,
        };

        let config = Self {
            instance_id: non_empty("DESTROY_INSTANCE_ID"),
            instance_name: non_empty("DESTROY_INSTANCE_NAME"),
            changeset_id: non_empty("DESTROY_CHANGESET_ID"),
            force,
            error_poll_timeout_ms,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject a configuration that cannot address an instance
    pub fn validate(&self) -> ConfigResult<()> {
        if self.instance_identifier().is_empty() {
            return Err(ConfigError::MissingInstance);
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "event_channel_capacity".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Identifier sent to the engine: the instance ID when known, else the name
    pub fn instance_identifier(&self) -> &str {
        self.instance_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.instance_name.as_deref())
            .unwrap_or_default()
    }

    pub fn error_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.error_poll_timeout_ms)
    }

    pub fn stale_finish_threshold(&self) -> TimeDelta {
        TimeDelta::seconds(self.stale_finish_threshold_secs)
    }
}

fn parse_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
