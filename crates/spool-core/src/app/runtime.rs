//! QueueRuntime - エンジン・退避先・poller をまとめたプロセス境界
//!
//! `QueueError::QueueOverflow` はここで必ず捕まえ、payload を sideline に流す。
//! ここを通さずに overflow を捨てるとメッセージが黙って消える。
//!
//! `submit` は 1 本の mpsc チャネルに積み、単一の submit ループが順に
//! `send` する。投入順とバッファへの追加順は常に一致する。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::builder::RuntimeBuilder;
use super::poller::Poller;
use crate::domain::EnvelopeId;
use crate::error::QueueError;
use crate::observability::QueueCounts;
use crate::ports::SidelineStore;
use crate::queue::InMemoryQueue;

/// Where a sent payload ended up.
#[derive(Debug)]
pub enum Delivery {
    Queued(EnvelopeId),
    Sidelined,
}

/// A payload waiting for the submit loop.
struct Submission {
    payload: serde_json::Value,
    expiry_time: DateTime<Utc>,
}

pub struct QueueRuntime {
    queue: Arc<InMemoryQueue>,
    sideline: Arc<dyn SidelineStore>,
    poller: Poller,
    submit_tx: mpsc::UnboundedSender<Submission>,
    submitter: JoinHandle<()>,
}

impl QueueRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub(super) fn new(
        queue: Arc<InMemoryQueue>,
        sideline: Arc<dyn SidelineStore>,
        poller: Poller,
    ) -> Self {
        let (submit_tx, submit_rx) = mpsc::unbounded_channel();
        let submitter = tokio::spawn(submit_loop(
            Arc::clone(&queue),
            Arc::clone(&sideline),
            submit_rx,
        ));
        Self {
            queue,
            sideline,
            poller,
            submit_tx,
            submitter,
        }
    }

    pub fn queue(&self) -> &Arc<InMemoryQueue> {
        &self.queue
    }

    pub fn sideline(&self) -> &Arc<dyn SidelineStore> {
        &self.sideline
    }

    /// Send, routing an overflow to the sideline.
    pub async fn send(&self, payload: serde_json::Value, expiry_time: DateTime<Utc>) -> Delivery {
        deliver(&self.queue, self.sideline.as_ref(), payload, expiry_time).await
    }

    /// Fire-and-forget [`send`](Self::send). Submits are appended in call
    /// order; one waiting out a full buffer holds back the ones behind it.
    /// Pending submits are drained by [`shutdown`](Self::shutdown).
    pub fn submit(&self, payload: serde_json::Value, expiry_time: DateTime<Utc>) {
        let submission = Submission {
            payload,
            expiry_time,
        };
        if let Err(mpsc::error::SendError(lost)) = self.submit_tx.send(submission) {
            error!("submit loop is gone, sidelining message");
            self.sideline.push(lost.payload);
        }
    }

    /// Move sidelined payloads back into the queue with a new expiry.
    ///
    /// Stops at the first payload that overflows again; that payload goes back
    /// to the head of the sideline. Returns how many were queued.
    pub async fn replay_sideline(&self, expiry_time: DateTime<Utc>) -> usize {
        let mut replayed = 0;
        while let Some(payload) = self.sideline.pop() {
            match self.queue.send(payload, expiry_time).await {
                Ok(id) => {
                    info!(envelope = %id, "replayed sidelined message");
                    replayed += 1;
                }
                Err(QueueError::QueueOverflow { payload }) => {
                    warn!("queue still full, stopping sideline replay");
                    self.sideline.push_front(payload);
                    break;
                }
                Err(e) => {
                    error!(error = %e, "sideline replay failed");
                    break;
                }
            }
        }
        replayed
    }

    pub async fn counts(&self) -> QueueCounts {
        self.queue.counts().await
    }

    /// Wait for pending submits, then stop polling and wait for in-flight
    /// dispatches.
    pub async fn shutdown(self) {
        let Self {
            poller,
            submit_tx,
            submitter,
            ..
        } = self;
        drop(submit_tx);
        if let Err(e) = submitter.await {
            error!(error = %e, "submit loop terminated abnormally");
        }
        poller.shutdown_and_join().await;
        info!("queue stopped");
    }
}

async fn submit_loop(
    queue: Arc<InMemoryQueue>,
    sideline: Arc<dyn SidelineStore>,
    mut rx: mpsc::UnboundedReceiver<Submission>,
) {
    while let Some(submission) = rx.recv().await {
        let delivery = deliver(
            &queue,
            sideline.as_ref(),
            submission.payload,
            submission.expiry_time,
        )
        .await;
        debug!(?delivery, "submit finished");
    }
}

async fn deliver(
    queue: &InMemoryQueue,
    sideline: &dyn SidelineStore,
    payload: serde_json::Value,
    expiry_time: DateTime<Utc>,
) -> Delivery {
    match queue.send(payload, expiry_time).await {
        Ok(id) => Delivery::Queued(id),
        Err(err) => {
            error!(error = %err, "failed to send message");
            match err.into_overflow_payload() {
                Some(payload) => sideline.push(payload),
                None => warn!("send failed without an overflow payload"),
            }
            Delivery::Sidelined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::impls::{FixedOutcome, InMemorySidelineStore, SimulatedHandler};
    use serde_json::json;
    use std::time::Duration;

    fn expiry() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::hours(1)
    }

    fn runtime(config: QueueConfig, sideline: Arc<InMemorySidelineStore>) -> QueueRuntime {
        QueueRuntime::builder()
            .config(config)
            .handler(
                SimulatedHandler::new("h")
                    .with_latency(Duration::ZERO)
                    .with_outcomes(Arc::new(FixedOutcome::succeed())),
            )
            .sideline(sideline)
            .start()
            .unwrap()
    }

    fn no_retries(capacity: usize) -> QueueConfig {
        QueueConfig {
            send_retries: 0,
            ..QueueConfig::with_capacity(capacity)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_is_routed_to_sideline() {
        let sideline = Arc::new(InMemorySidelineStore::new());
        let rt = runtime(no_retries(2), sideline.clone());

        assert!(matches!(rt.send(json!("A"), expiry()).await, Delivery::Queued(_)));
        assert!(matches!(rt.send(json!("B"), expiry()).await, Delivery::Queued(_)));
        assert!(matches!(rt.send(json!("C"), expiry()).await, Delivery::Sidelined));

        assert_eq!(sideline.snapshot(), vec![json!("C")]);
        assert_eq!(rt.counts().await.buffered(), 2);
        rt.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_messages_are_awaited_on_shutdown() {
        let sideline = Arc::new(InMemorySidelineStore::new());
        let rt = runtime(no_retries(4), sideline.clone());

        for i in 0..5 {
            rt.submit(json!({"n": i}), expiry());
        }
        let queue = Arc::clone(rt.queue());
        rt.shutdown().await;

        assert_eq!(sideline.len(), 1);
        assert_eq!(queue.counts().await.enqueued, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn sidelined_payloads_can_be_replayed() {
        let sideline = Arc::new(InMemorySidelineStore::new());
        let rt = runtime(no_retries(1), sideline.clone());

        rt.send(json!("A"), expiry()).await;
        rt.send(json!("B"), expiry()).await;
        assert_eq!(sideline.len(), 1);

        // Nothing fits yet: B goes back.
        assert_eq!(rt.replay_sideline(expiry()).await, 0);
        assert_eq!(sideline.snapshot(), vec![json!("B")]);

        // First tick processes A.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(rt.counts().await.succeeded, 1);

        assert_eq!(rt.replay_sideline(expiry()).await, 1);
        assert!(sideline.is_empty());
        assert_eq!(rt.counts().await.buffered(), 1);
        rt.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_replay_keeps_the_oldest_entry_first() {
        let sideline = Arc::new(InMemorySidelineStore::new());
        let rt = runtime(no_retries(1), sideline.clone());

        rt.send(json!("A"), expiry()).await;
        rt.send(json!("B"), expiry()).await;
        rt.send(json!("C"), expiry()).await;
        assert_eq!(sideline.snapshot(), vec![json!("B"), json!("C")]);

        assert_eq!(rt.replay_sideline(expiry()).await, 0);
        assert_eq!(sideline.snapshot(), vec![json!("B"), json!("C")]);

        // A is processed on the first tick; B fits, C overflows again.
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(rt.replay_sideline(expiry()).await, 1);
        assert_eq!(sideline.snapshot(), vec![json!("C")]);

        let queued: Vec<_> = rt
            .queue()
            .envelopes()
            .await
            .into_iter()
            .map(|e| e.payload().clone())
            .collect();
        assert_eq!(queued, vec![json!("B")]);
        rt.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn submits_are_appended_in_call_order() {
        let sideline = Arc::new(InMemorySidelineStore::new());
        let config = QueueConfig {
            poll_interval_secs: 3600,
            ..no_retries(200)
        };
        let rt = runtime(config, sideline.clone());

        for n in 0..200 {
            rt.submit(json!(n), expiry());
        }
        let queue = Arc::clone(rt.queue());
        rt.shutdown().await;

        let order: Vec<_> = queue
            .envelopes()
            .await
            .into_iter()
            .map(|e| e.payload().clone())
            .collect();
        let expected: Vec<_> = (0..200).map(|n| json!(n)).collect();
        assert_eq!(order, expected);
        assert!(sideline.is_empty());
    }
}
