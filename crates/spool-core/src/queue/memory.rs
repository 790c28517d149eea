//! In-memory queue engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::dispatch::DispatchJob;
use super::pool::HandlerPool;
use super::retry::RetryPolicy;
use super::state::QueueState;
use crate::config::QueueConfig;
use crate::domain::{Envelope, EnvelopeId};
use crate::error::QueueError;
use crate::observability::QueueCounts;
use crate::ports::{Clock, MessageHandler, SystemClock};

/// Result of one poll tick.
pub enum Tick {
    /// No unlocked envelope.
    Idle,

    /// Every handler is checked out by an in-flight dispatch.
    NoHandlerAvailable,

    /// The selected envelope had expired and was dropped.
    Expired(EnvelopeId),

    /// The front handler's pattern rejected the selected envelope. The handler
    /// went to the back of the pool; the envelope stays unlocked.
    Mismatched { envelope: EnvelopeId, handler: String },

    /// The envelope is locked and ready to be processed.
    Dispatched(DispatchJob),
}

impl std::fmt::Debug for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tick::Idle => f.write_str("Idle"),
            Tick::NoHandlerAvailable => f.write_str("NoHandlerAvailable"),
            Tick::Expired(id) => f.debug_tuple("Expired").field(id).finish(),
            Tick::Mismatched { envelope, handler } => f
                .debug_struct("Mismatched")
                .field("envelope", envelope)
                .field("handler", handler)
                .finish(),
            Tick::Dispatched(job) => f
                .debug_struct("Dispatched")
                .field("envelope", &job.envelope())
                .field("handler", &job.handler_name())
                .finish(),
        }
    }
}

/// Bounded in-memory queue with a rotating handler pool.
///
/// All buffer and pool mutation happens under `state`; the lock is never held
/// while a handler runs.
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
    clock: Arc<dyn Clock>,
    send_policy: RetryPolicy,
    dispatch_policy: RetryPolicy,
}

impl InMemoryQueue {
    pub fn new(
        handlers: Vec<Arc<dyn MessageHandler>>,
        config: &QueueConfig,
    ) -> Result<Self, QueueError> {
        Self::with_clock(handlers, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        handlers: Vec<Arc<dyn MessageHandler>>,
        config: &QueueConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, QueueError> {
        if handlers.is_empty() {
            return Err(QueueError::NoHandlers);
        }
        let pool = HandlerPool::new(handlers);
        Ok(Self {
            state: Arc::new(Mutex::new(QueueState::new(config.capacity, pool))),
            clock,
            send_policy: config.send_policy(),
            dispatch_policy: config.dispatch_policy(),
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Append a payload, waiting out a full buffer up to the send retry budget.
    ///
    /// The only error is [`QueueError::QueueOverflow`], which hands the payload
    /// back so the caller can sideline it.
    pub async fn send(
        &self,
        payload: serde_json::Value,
        expiry_time: DateTime<Utc>,
    ) -> Result<EnvelopeId, QueueError> {
        let mut pending = self.send_policy.max_retries;
        loop {
            let err = {
                let mut state = self.state.lock().await;
                match state.ensure_capacity() {
                    Ok(()) => {
                        let id = state.push(Envelope::new(payload, expiry_time));
                        info!(envelope = %id, "message added to queue");
                        return Ok(id);
                    }
                    Err(err) if pending == 0 => {
                        state.stats.overflowed += 1;
                        err
                    }
                    Err(err) => {
                        state.stats.send_retries += 1;
                        err
                    }
                }
            };

            if pending == 0 {
                error!(error = %err, %payload, "send retries exhausted");
                return Err(QueueError::QueueOverflow { payload });
            }

            warn!(error = %err, "unable to send message");
            let attempt = self.send_policy.attempt_number(pending);
            tokio::time::sleep(self.send_policy.delay).await;
            info!(attempt, "retrying send");
            pending -= 1;
        }
    }

    /// Run the selection algorithm once.
    ///
    /// Looks at the first unlocked envelope only. Expired envelopes are
    /// dropped; otherwise the front handler of the pool either takes it
    /// (`Dispatched`) or, on a pattern mismatch, goes straight to the back of
    /// the pool and the tick ends.
    pub async fn tick(&self) -> Tick {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let Some(index) = state.first_unlocked() else {
            return Tick::Idle;
        };

        if state.buffer[index].is_expired_at(now) {
            let Some(expired) = state.buffer.remove(index) else {
                return Tick::Idle;
            };
            state.stats.expired += 1;
            info!(envelope = %expired.id(), message = %expired.wire(), "message expired");
            return Tick::Expired(expired.id());
        }

        let Some((slot, handler)) = state.pool.checkout() else {
            debug!("all handlers busy");
            return Tick::NoHandlerAvailable;
        };

        let envelope = &mut state.buffer[index];
        let id = envelope.id();
        if !handler.accepts(&envelope.wire()) {
            let name = handler.name().to_string();
            state.pool.checkin(slot);
            state.stats.mismatched += 1;
            debug!(envelope = %id, handler = %name, "handler pattern does not match");
            return Tick::Mismatched {
                envelope: id,
                handler: name,
            };
        }

        envelope.lock();
        let message = envelope.wire();
        info!(envelope = %id, index, handler = handler.name(), "locking message");

        Tick::Dispatched(DispatchJob {
            state: Arc::clone(&self.state),
            envelope: id,
            message,
            slot,
            handler,
            policy: self.dispatch_policy.clone(),
        })
    }

    pub async fn counts(&self) -> QueueCounts {
        self.state.lock().await.counts()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.buffer.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy of the buffer, arrival order.
    pub async fn envelopes(&self) -> Vec<Envelope> {
        self.state.lock().await.buffer.iter().cloned().collect()
    }

    /// Names of available handlers, front of the pool first.
    pub async fn pool_order(&self) -> Vec<String> {
        self.state.lock().await.pool.ring_names()
    }
}
