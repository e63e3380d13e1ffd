use std::time::Duration;

use serde::Serialize;

use crate::{ConfigError, Lookup};

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_success_notice_delay_ms() -> u64 {
    2000
}

fn default_shutdown_grace_ms() -> u64 {
    3000
}

fn default_single_flight() -> bool {
    true
}

#[derive(Debug, Serialize, Clone)]
pub struct PipelineConfig {
    pub max_attempts: u32,
    /// First retry delay, doubled after every retryable failure
    pub initial_backoff_ms: u64,
    /// Pause between the answer notification and the "copied" notification
    pub success_notice_delay_ms: u64,
    /// How long the panic hotkey waits for in-flight runs
    pub shutdown_grace_ms: u64,
    /// At most one in-flight run; extra presses are ignored
    pub single_flight: bool,
    pub notify_on_start: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            success_notice_delay_ms: default_success_notice_delay_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            single_flight: default_single_flight(),
            notify_on_start: false,
        }
    }
}

impl PipelineConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            max_attempts: env.parse_or("MAX_ATTEMPTS", default_max_attempts())?,
            initial_backoff_ms: env.parse_or("INITIAL_BACKOFF_MS", default_initial_backoff_ms())?,
            success_notice_delay_ms: env.parse_or(
                "SUCCESS_NOTICE_DELAY_MS",
                default_success_notice_delay_ms(),
            )?,
            shutdown_grace_ms: env.parse_or("SHUTDOWN_GRACE_MS", default_shutdown_grace_ms())?,
            single_flight: env.flag_or("SINGLE_FLIGHT", default_single_flight())?,
            notify_on_start: env.flag_or("NOTIFY_ON_START", false)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_ATTEMPTS",
                value: self.max_attempts.to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn success_notice_delay(&self) -> Duration {
        Duration::from_millis(self.success_notice_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
