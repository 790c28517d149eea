//! OutcomeSource port - シミュレーション用 handler の成否を決める
//!
//! 乱数を直接使わず注入可能にすることで、テストを決定的にする。

/// Decides whether the next simulated attempt succeeds.
pub trait OutcomeSource: Send + Sync {
    fn next_success(&self) -> bool;
}
