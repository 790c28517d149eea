//! HandlerPool - handler の回転プール
//!
//! handler 本体は不変のテーブルに置き、プールは `HandlerSlot`（index）の
//! リングとして扱う。checkout で先頭を取り出し、checkin で末尾へ戻す。

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::warn;

use crate::ports::MessageHandler;

/// Handle to one handler in the pool's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerSlot(usize);

impl HandlerSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ring of available handlers.
///
/// Invariant: `available() + busy() == total()`. A slot is either in the ring
/// or checked out by exactly one dispatch.
pub struct HandlerPool {
    handlers: Vec<Arc<dyn MessageHandler>>,
    available: VecDeque<HandlerSlot>,
}

impl HandlerPool {
    /// Ring order follows the given order.
    pub fn new(handlers: Vec<Arc<dyn MessageHandler>>) -> Self {
        let available = (0..handlers.len()).map(HandlerSlot).collect();
        Self {
            handlers,
            available,
        }
    }

    /// Take the handler at the front of the ring.
    pub fn checkout(&mut self) -> Option<(HandlerSlot, Arc<dyn MessageHandler>)> {
        let slot = self.available.pop_front()?;
        Some((slot, Arc::clone(&self.handlers[slot.0])))
    }

    /// Return a checked-out handler to the back of the ring.
    pub fn checkin(&mut self, slot: HandlerSlot) {
        if slot.0 >= self.handlers.len() || self.available.contains(&slot) {
            // A slot returned twice would duplicate a handler in the ring.
            warn!(slot = slot.0, "ignoring checkin of a slot that is not checked out");
            debug_assert!(false, "slot {} checked in twice", slot.0);
            return;
        }
        self.available.push_back(slot);
    }

    pub fn total(&self) -> usize {
        self.handlers.len()
    }

    pub fn available(&self) -> usize {
        self.available.len()
    }

    pub fn busy(&self) -> usize {
        self.total() - self.available()
    }

    /// Names of available handlers, front of the ring first.
    pub fn ring_names(&self) -> Vec<String> {
        self.available
            .iter()
            .map(|slot| self.handlers[slot.0].name().to_string())
            .collect()
    }
}
