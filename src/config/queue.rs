//! Queue polling configuration.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_MESSAGES, DEFAULT_RECEIVE_ERROR_BACKOFF_MS, DEFAULT_WAIT_TIME_SECONDS,
    MAX_MESSAGES_LIMIT, MAX_WAIT_TIME_SECONDS,
};

fn default_max_messages() -> i32 {
    DEFAULT_MAX_MESSAGES
}

fn default_wait_time_seconds() -> i32 {
    DEFAULT_WAIT_TIME_SECONDS
}

fn default_receive_error_backoff_ms() -> u64 {
    DEFAULT_RECEIVE_ERROR_BACKOFF_MS
}

/// Which receipt handles get deleted after a batch is processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// Delete one message per batch, using the last record's handle, whatever
    /// the per-record outcomes were. With more than one record per batch,
    /// earlier records are never deleted and failed ones may be acknowledged.
    #[default]
    LastInBatch,
    /// Delete each record right after all of its events succeeded; failed
    /// records are left for redelivery.
    PerRecord,
}

/// Notification queue settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Full SQS queue URL (required)
    #[serde(default)]
    pub queue_url: String,

    /// Messages requested per receive call, 1..=10 (default: 1)
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,

    /// Long-poll wait in seconds, 0..=20 (default: 20)
    #[serde(default = "default_wait_time_seconds")]
    pub wait_time_seconds: i32,

    /// Pause after a failed receive call (default: 1000 ms)
    #[serde(default = "default_receive_error_backoff_ms")]
    pub receive_error_backoff_ms: u64,

    /// Acknowledgement strategy (default: last_in_batch)
    #[serde(default)]
    pub acknowledgement: AckMode,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            receive_error_backoff_ms: DEFAULT_RECEIVE_ERROR_BACKOFF_MS,
            acknowledgement: AckMode::default(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_url.trim().is_empty() {
            return Err("queue.queue_url is required".to_string());
        }
        if !(1..=MAX_MESSAGES_LIMIT).contains(&self.max_messages) {
            return Err(format!(
                "queue.max_messages must be between 1 and {}, got {}",
                MAX_MESSAGES_LIMIT, self.max_messages
            ));
        }
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&self.wait_time_seconds) {
            return Err(format!(
                "queue.wait_time_seconds must be between 0 and {}, got {}",
                MAX_WAIT_TIME_SECONDS, self.wait_time_seconds
            ));
        }
        Ok(())
    }
}
