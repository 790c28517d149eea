use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use spool_core::impls::{InMemorySidelineStore, SimulatedHandler};
use spool_core::{MatchPattern, QueueConfig, QueueRuntime};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// spool - in-process message queue demo
#[derive(Parser, Debug)]
#[command(name = "spool", version, about, long_about = None)]
struct Args {
    /// JSON config file (QueueConfig). Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of buffered messages
    #[arg(long)]
    capacity: Option<usize>,

    /// Seconds between poll ticks
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Send retries before a message is sidelined
    #[arg(long)]
    send_retries: Option<u32>,

    /// Time-to-live of each demo message
    #[arg(long, default_value = "15")]
    ttl_secs: i64,

    /// How long to run before shutting down
    #[arg(long, default_value = "30")]
    run_secs: u64,

    /// Log level (trace, debug, info, warn, error), ignored when RUST_LOG is set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn queue_config(&self) -> Result<QueueConfig, spool_core::ConfigError> {
        let mut config = match &self.config {
            Some(path) => QueueConfig::from_file(path)?,
            None => QueueConfig::default(),
        };
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval_secs = secs;
        }
        if let Some(retries) = self.send_retries {
            config.send_retries = retries;
        }
        Ok(config)
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spool={level},spool_core={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = args.queue_config()?;
    let sideline = Arc::new(InMemorySidelineStore::new());

    // (A) pattern 付き handler 2 つ、容量 4 のキュー
    let runtime = QueueRuntime::builder()
        .config(config)
        .handler(SimulatedHandler::new("messageHandler1").with_pattern(MatchPattern::new("abc")?))
        .handler(SimulatedHandler::new("messageHandler2").with_pattern(MatchPattern::new("xyz")?))
        .sideline(sideline.clone())
        .start()?;

    // (B) 5 件投入。容量を超えた分は sideline へ
    let expiry = Utc::now() + chrono::Duration::seconds(args.ttl_secs);
    for id in ["abc1", "xyz2", "abc3", "xyz4", "abc5"] {
        runtime.submit(serde_json::json!({ "messageId": id }), expiry);
    }

    // (C) 一定時間動かす（Ctrl-C で早期終了）
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.run_secs)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    // (D) 停止して結果を表示
    let queue = Arc::clone(runtime.queue());
    runtime.shutdown().await;

    let counts = queue.counts().await;
    println!("counts: {}", serde_json::to_string_pretty(&counts)?);
    for envelope in queue.envelopes().await {
        println!("still queued: {}", envelope.wire());
    }
    for payload in sideline.snapshot() {
        println!("sidelined: {payload}");
    }
    Ok(())
}
