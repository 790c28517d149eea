//! Poller - 一定間隔で tick を回すループ
//!
//! - `shutdown_tx` に true を送るか drop するとループが止まる
//! - in-flight の dispatch は JoinSet で保持し、停止時にすべて待つ

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::queue::{DispatchReport, InMemoryQueue, Tick};

/// Poll loop handle.
pub struct Poller {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl Poller {
    /// Spawn the poll loop. The first tick fires one `interval` from now.
    pub fn spawn(queue: Arc<InMemoryQueue>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(poll_loop(queue, interval, shutdown_rx));
        Self { shutdown_tx, join }
    }

    /// Stop ticking. In-flight dispatches still run to completion.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop ticking and wait for every in-flight dispatch.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            error!(error = %e, "poll loop terminated abnormally");
        }
    }
}

async fn poll_loop(
    queue: Arc<InMemoryQueue>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: JoinSet<DispatchReport> = JoinSet::new();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_completion(done);
                continue;
            }
            _ = ticker.tick() => {}
        }

        match queue.tick().await {
            Tick::Dispatched(job) => {
                in_flight.spawn(job.run());
            }
            Tick::Idle => {}
            other => debug!(tick = ?other, "poll tick"),
        }
    }

    if !in_flight.is_empty() {
        info!(in_flight = in_flight.len(), "waiting for in-flight dispatches");
    }
    while let Some(done) = in_flight.join_next().await {
        log_completion(done);
    }
}

fn log_completion(done: Result<DispatchReport, JoinError>) {
    match done {
        Ok(report) => debug!(
            envelope = %report.envelope,
            handler = %report.handler,
            attempts = report.attempts,
            state = ?report.state,
            "dispatch finished"
        ),
        Err(e) => error!(error = %e, "dispatch task failed"),
    }
}
