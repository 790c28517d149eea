//! spool-core
//!
//! プロセス内に埋め込む、容量制限付きのインメモリ・メッセージキュー。
//!
//! # モジュール構成
//! - **domain**: Envelope, EnvelopeId, MatchPattern
//! - **ports**: 外部協力者の抽象（MessageHandler, SidelineStore, Clock, OutcomeSource）
//! - **queue**: エンジン本体（バッファ、handler プール、tick、dispatch の状態機械）
//! - **app**: ワイヤリング（RuntimeBuilder, QueueRuntime, Poller）
//! - **impls**: プロセス内実装（InMemorySidelineStore, SimulatedHandler など）
//! - **config**: QueueConfig
//! - **error**: QueueError, HandlerError
//! - **observability**: QueueCounts

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{BuildError, Delivery, QueueRuntime, RuntimeBuilder};
pub use config::{ConfigError, QueueConfig};
pub use domain::{Envelope, EnvelopeId, MatchPattern};
pub use error::{HandlerError, QueueError};
pub use observability::QueueCounts;
pub use queue::{InMemoryQueue, Tick};
