//! RuntimeBuilder - キューのワイヤリングと起動時検証
//!
//! # Fail-fast 設計
//! - handler が 1 つも無い、名前が重複している、config が不正
//!   のいずれかなら build 時点で BuildError を返す

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::poller::Poller;
use super::runtime::QueueRuntime;
use crate::config::{ConfigError, QueueConfig};
use crate::error::QueueError;
use crate::impls::InMemorySidelineStore;
use crate::ports::{Clock, MessageHandler, SidelineStore, SystemClock};
use crate::queue::InMemoryQueue;

/// Errors detected while wiring a runtime.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("at least one handler must be registered")]
    NoHandlers,

    #[error("duplicate handler name: {0}")]
    DuplicateHandler(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Builds a [`QueueRuntime`].
///
/// # 使用例
/// ```ignore
/// let runtime = QueueRuntime::builder()
///     .config(QueueConfig::with_capacity(4))
///     .handler(SimulatedHandler::new("messageHandler1"))
///     .start()?;
/// ```
pub struct RuntimeBuilder {
    config: QueueConfig,
    handlers: Vec<Arc<dyn MessageHandler>>,
    sideline: Option<Arc<dyn SidelineStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: QueueConfig::default(),
            handlers: Vec::new(),
            sideline: None,
            clock: None,
        }
    }

    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Handlers enter the pool in registration order.
    pub fn handler(self, handler: impl MessageHandler + 'static) -> Self {
        self.shared_handler(Arc::new(handler))
    }

    pub fn shared_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Defaults to an [`InMemorySidelineStore`].
    pub fn sideline(mut self, sideline: Arc<dyn SidelineStore>) -> Self {
        self.sideline = Some(sideline);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        self.config.validate()?;
        if self.handlers.is_empty() {
            return Err(BuildError::NoHandlers);
        }
        let mut seen = HashSet::new();
        for handler in &self.handlers {
            if !seen.insert(handler.name()) {
                return Err(BuildError::DuplicateHandler(handler.name().to_string()));
            }
        }
        Ok(())
    }

    /// Validate, build the engine and start polling. Must be called inside a
    /// tokio runtime.
    pub fn start(self) -> Result<QueueRuntime, BuildError> {
        self.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let sideline = self
            .sideline
            .unwrap_or_else(|| Arc::new(InMemorySidelineStore::new()) as Arc<dyn SidelineStore>);
        let queue = Arc::new(InMemoryQueue::with_clock(
            self.handlers,
            &self.config,
            clock,
        )?);
        let poller = Poller::spawn(Arc::clone(&queue), self.config.poll_interval());
        info!(
            capacity = self.config.capacity,
            poll_interval_secs = self.config.poll_interval_secs,
            "queue started"
        );

        Ok(QueueRuntime::new(queue, sideline, poller))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::SimulatedHandler;

    #[tokio::test]
    async fn test_start_success() {
        let runtime = RuntimeBuilder::new()
            .handler(SimulatedHandler::new("h1"))
            .handler(SimulatedHandler::new("h2"))
            .start()
            .unwrap();
        assert_eq!(runtime.counts().await.available_handlers, 2);
        runtime.shutdown().await;
    }

    #[test]
    fn test_no_handlers() {
        let err = RuntimeBuilder::new().validate().unwrap_err();
        assert!(matches!(err, BuildError::NoHandlers));
    }

    #[test]
    fn test_duplicate_handler() {
        let err = RuntimeBuilder::new()
            .handler(SimulatedHandler::new("same"))
            .handler(SimulatedHandler::new("same"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateHandler(name) if name == "same"));
    }

    #[test]
    fn test_invalid_config() {
        let err = RuntimeBuilder::new()
            .config(QueueConfig::with_capacity(0))
            .handler(SimulatedHandler::new("h"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::Invalid { field: "capacity", .. })));
    }
}
