//! Impls - ports の実装（プロセス内・デモ用）
//!
//! # 含まれる実装
//! - **InMemorySidelineStore**: プロセス内の退避キュー
//! - **SimulatedHandler**: 遅延と成否を注入できる handler
//! - **RandomOutcome / FixedOutcome / ScriptedOutcome**: OutcomeSource

pub mod inmem_sideline;
pub mod outcome;
pub mod simulated_handler;

pub use self::inmem_sideline::InMemorySidelineStore;
pub use self::outcome::{FixedOutcome, RandomOutcome, ScriptedOutcome};
pub use self::simulated_handler::SimulatedHandler;
