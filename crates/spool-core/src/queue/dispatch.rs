//! Dispatch: drive one locked envelope through its handler.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::pool::HandlerSlot;
use super::retry::RetryPolicy;
use super::state::{DispatchState, QueueState};
use crate::domain::EnvelopeId;
use crate::error::HandlerError;
use crate::ports::MessageHandler;

/// A locked envelope paired with a checked-out handler.
///
/// Produced by a poll tick. Until `run` completes the envelope stays locked and
/// the handler stays out of the pool.
#[must_use = "the envelope stays locked and the handler checked out until the job runs"]
pub struct DispatchJob {
    pub(super) state: Arc<Mutex<QueueState>>,
    pub(super) envelope: EnvelopeId,
    pub(super) message: String,
    pub(super) slot: HandlerSlot,
    pub(super) handler: Arc<dyn MessageHandler>,
    pub(super) policy: RetryPolicy,
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub envelope: EnvelopeId,
    pub handler: String,
    /// Handler calls made, first one included.
    pub attempts: u32,
    /// Always terminal.
    pub state: DispatchState,
}

impl DispatchJob {
    pub fn envelope(&self) -> EnvelopeId {
        self.envelope
    }

    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// Serialized envelope the handler receives.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call the handler, retrying rejections with the same handler and the
    /// same envelope, then settle the envelope and return the handler.
    pub async fn run(self) -> DispatchReport {
        let mut pending = self.policy.max_retries;
        let mut attempts = 0;
        debug!(
            envelope = %self.envelope,
            handler = self.handler.name(),
            slot = self.slot.index(),
            state = ?DispatchState::LockedPending,
            "dispatching message"
        );

        let succeeded = loop {
            attempts += 1;
            match self.attempt().await {
                Ok(()) => break true,
                Err(err) if pending > 0 => {
                    let retry = self.policy.attempt_number(pending);
                    warn!(
                        envelope = %self.envelope,
                        handler = self.handler.name(),
                        error = %err,
                        retry,
                        state = ?DispatchState::Retrying,
                        "consumer is unable to process message"
                    );
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                    pending -= 1;
                }
                Err(err) => {
                    error!(
                        envelope = %self.envelope,
                        handler = self.handler.name(),
                        error = %err,
                        attempts,
                        "consumer failed to process message"
                    );
                    break false;
                }
            }
        };

        let state = self.settle(succeeded).await;
        DispatchReport {
            envelope: self.envelope,
            handler: self.handler.name().to_string(),
            attempts,
            state,
        }
    }

    /// One handler call. A panic inside `receive` counts as a failed attempt
    /// so the job still reaches `settle`.
    async fn attempt(&self) -> Result<(), HandlerError> {
        match AssertUnwindSafe(self.handler.receive(&self.message))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::panicked(
                self.handler.name(),
                panic_message(panic.as_ref()),
            )),
        }
    }

    /// Single exit point: the handler goes back to the pool here and only here.
    async fn settle(&self, succeeded: bool) -> DispatchState {
        let mut state = self.state.lock().await;

        let outcome = if succeeded {
            if state.remove(self.envelope).is_none() {
                warn!(envelope = %self.envelope, "processed envelope already gone");
            }
            state.stats.succeeded += 1;
            info!(
                envelope = %self.envelope,
                handler = self.handler.name(),
                "message processed, removed from queue"
            );
            DispatchState::Succeeded
        } else {
            match state.find_mut(self.envelope) {
                Some(envelope) => envelope.unlock(),
                None => warn!(envelope = %self.envelope, "failed envelope already gone"),
            }
            state.stats.exhausted += 1;
            info!(envelope = %self.envelope, "removing lock of message");
            DispatchState::FailedUnlocked
        };

        state.pool.checkin(self.slot);
        outcome
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "handler panicked".to_string()
    }
}
