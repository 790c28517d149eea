//! SimulatedHandler - 遅延と成否を差し替え可能な handler
//!
//! デモとテスト用。受信をログに出し、一定時間待ってから
//! OutcomeSource の結果に従って成功/失敗を返す。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::MatchPattern;
use crate::error::HandlerError;
use crate::impls::outcome::RandomOutcome;
use crate::ports::{MessageHandler, OutcomeSource};

pub struct SimulatedHandler {
    name: String,
    pattern: Option<MatchPattern>,
    latency: Duration,
    outcomes: Arc<dyn OutcomeSource>,
    received: AtomicU32,
}

impl SimulatedHandler {
    /// One second latency, coin-flip outcome.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: None,
            latency: Duration::from_secs(1),
            outcomes: Arc::new(RandomOutcome),
            received: AtomicU32::new(0),
        }
    }

    pub fn with_pattern(mut self, pattern: MatchPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_outcomes(mut self, outcomes: Arc<dyn OutcomeSource>) -> Self {
        self.outcomes = outcomes;
        self
    }

    /// Number of `receive` calls so far.
    pub fn received(&self) -> u32 {
        self.received.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageHandler for SimulatedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Option<&MatchPattern> {
        self.pattern.as_ref()
    }

    async fn receive(&self, message: &str) -> Result<(), HandlerError> {
        self.received.fetch_add(1, Ordering::Relaxed);
        info!(handler = %self.name, %message, "message received");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.outcomes.next_success() {
            info!(handler = %self.name, "message processed successfully");
            Ok(())
        } else {
            warn!(handler = %self.name, "failed to process message");
            Err(HandlerError::rejected(&self.name, "simulated failure"))
        }
    }
}
