//! Queue configuration.
//!
//! JSON で読み込むか、コード上で組み立てる。全フィールドにデフォルトあり。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings for one queue engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum number of buffered envelopes.
    pub capacity: usize,

    /// Poll tick frequency.
    pub poll_interval_secs: u64,

    /// How many times `send` retries a full buffer before overflowing.
    pub send_retries: u32,

    /// Fixed delay between send retries.
    pub send_backoff_ms: u64,

    /// How many times a dispatch re-invokes a rejecting handler.
    pub dispatch_retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            poll_interval_secs: 2,
            send_retries: 3,
            send_backoff_ms: 2000,
            dispatch_retries: 3,
        }
    }
}

impl QueueConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn send_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.send_retries, Duration::from_millis(self.send_backoff_ms))
    }

    /// Dispatch retries run back-to-back, without delay.
    pub fn dispatch_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.dispatch_retries, Duration::ZERO)
    }
}
