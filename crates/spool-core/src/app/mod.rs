//! App - アプリケーション層
//!
//! ports と queue を組み合わせて、プロセスに埋め込める形にまとめる。
//!
//! # 主要コンポーネント
//! - **RuntimeBuilder**: ワイヤリングと起動時検証
//! - **QueueRuntime**: send / submit / overflow の sideline への振り分け
//! - **Poller**: 一定間隔の tick と in-flight dispatch の管理

pub mod builder;
pub mod poller;
pub mod runtime;

pub use self::builder::{BuildError, RuntimeBuilder};
pub use self::poller::Poller;
pub use self::runtime::{Delivery, QueueRuntime};
