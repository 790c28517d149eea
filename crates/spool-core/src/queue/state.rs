//! Engine state: bounded buffer + handler pool, owned by one mutex.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::pool::HandlerPool;
use crate::domain::{Envelope, EnvelopeId};
use crate::error::QueueError;
use crate::observability::QueueCounts;

/// Dispatch state of one in-flight envelope.
///
/// State transitions:
/// - LockedPending -> Succeeded
/// - LockedPending -> Retrying -> ... -> Succeeded
/// - LockedPending -> Retrying -> ... -> FailedUnlocked (retry budget exhausted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchState {
    /// Locked, first handler call in progress.
    LockedPending,

    /// Handler rejected; calling it again on the same locked envelope.
    Retrying,

    /// Processed and removed from the buffer.
    Succeeded,

    /// Budget exhausted; unlocked and left in the buffer.
    FailedUnlocked,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Succeeded | DispatchState::FailedUnlocked)
    }
}

/// Cumulative counters kept next to the buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct QueueStats {
    pub enqueued: u64,
    pub succeeded: u64,
    pub expired: u64,
    pub exhausted: u64,
    pub mismatched: u64,
    pub send_retries: u64,
    pub overflowed: u64,
}

/// Everything the engine mutates. Only ever touched under the engine's lock.
pub(crate) struct QueueState {
    pub capacity: usize,
    /// Arrival order.
    pub buffer: VecDeque<Envelope>,
    pub pool: HandlerPool,
    pub stats: QueueStats,
}

impl QueueState {
    pub fn new(capacity: usize, pool: HandlerPool) -> Self {
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            pool,
            stats: QueueStats::default(),
        }
    }

    pub fn ensure_capacity(&self) -> Result<(), QueueError> {
        if self.buffer.len() < self.capacity {
            Ok(())
        } else {
            Err(QueueError::CapacityExceeded {
                capacity: self.capacity,
            })
        }
    }

    /// Callers check `ensure_capacity` first.
    pub fn push(&mut self, envelope: Envelope) -> EnvelopeId {
        let id = envelope.id();
        self.buffer.push_back(envelope);
        self.stats.enqueued += 1;
        id
    }

    /// Index of the first unlocked envelope.
    pub fn first_unlocked(&self) -> Option<usize> {
        self.buffer.iter().position(|e| !e.is_locked())
    }

    pub fn find_mut(&mut self, id: EnvelopeId) -> Option<&mut Envelope> {
        self.buffer.iter_mut().find(|e| e.id() == id)
    }

    pub fn remove(&mut self, id: EnvelopeId) -> Option<Envelope> {
        let index = self.buffer.iter().position(|e| e.id() == id)?;
        self.buffer.remove(index)
    }

    pub fn counts(&self) -> QueueCounts {
        let locked = self.buffer.iter().filter(|e| e.is_locked()).count();
        QueueCounts {
            queued: self.buffer.len() - locked,
            locked,
            available_handlers: self.pool.available(),
            busy_handlers: self.pool.busy(),
            enqueued: self.stats.enqueued,
            succeeded: self.stats.succeeded,
            expired: self.stats.expired,
            exhausted: self.stats.exhausted,
            mismatched: self.stats.mismatched,
            send_retries: self.stats.send_retries,
            overflowed: self.stats.overflowed,
        }
    }
}
