use serde::{Deserialize, Serialize};

/// Point-in-time view of one queue engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Buffered and unlocked.
    pub queued: usize,
    /// Buffered and held by an in-flight dispatch.
    pub locked: usize,
    pub available_handlers: usize,
    pub busy_handlers: usize,

    // Cumulative since construction.
    pub enqueued: u64,
    pub succeeded: u64,
    pub expired: u64,
    pub exhausted: u64,
    pub mismatched: u64,
    pub send_retries: u64,
    pub overflowed: u64,
}

impl QueueCounts {
    pub fn buffered(&self) -> usize {
        self.queued + self.locked
    }

    pub fn total_handlers(&self) -> usize {
        self.available_handlers + self.busy_handlers
    }
}
