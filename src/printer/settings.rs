use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often a busy interface is retried before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            backoff_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Timing parameters of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub transfer_timeout_ms: u64,
    pub interrupt_timeout_ms: u64,
    /// Overrides the settle delay of models that need one after a reset.
    pub settle_delay_ms: Option<u64>,
    pub claim_retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transfer_timeout_ms: 5000,
            interrupt_timeout_ms: 5000,
            settle_delay_ms: None,
            claim_retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    pub fn interrupt_timeout(&self) -> Duration {
        Duration::from_millis(self.interrupt_timeout_ms)
    }

    pub fn settle_delay(&self) -> Option<Duration> {
        self.settle_delay_ms.map(Duration::from_millis)
    }
}
