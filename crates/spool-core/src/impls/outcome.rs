//! OutcomeSource の実装
//!
//! - RandomOutcome: 公平なコイン（本番デモ用）
//! - FixedOutcome: 常に同じ結果
//! - ScriptedOutcome: 台本どおりに返し、尽きたら fallback

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::Rng;

use crate::ports::OutcomeSource;

/// Fair coin flip.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcome;

impl OutcomeSource for RandomOutcome {
    fn next_success(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub bool);

impl FixedOutcome {
    pub fn succeed() -> Self {
        Self(true)
    }

    pub fn fail() -> Self {
        Self(false)
    }
}

impl OutcomeSource for FixedOutcome {
    fn next_success(&self) -> bool {
        self.0
    }
}

#[derive(Debug)]
pub struct ScriptedOutcome {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedOutcome {
    pub fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
        }
    }
}

impl OutcomeSource for ScriptedOutcome {
    fn next_success(&self) -> bool {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_outcome_follows_script_then_fallback() {
        let source = ScriptedOutcome::new([false, true], false);
        assert!(!source.next_success());
        assert!(source.next_success());
        assert!(!source.next_success());
        assert!(!source.next_success());
    }

    #[test]
    fn fixed_outcome_never_changes() {
        assert!(FixedOutcome::succeed().next_success());
        assert!(!FixedOutcome::fail().next_success());
    }

    #[test]
    fn random_outcome_produces_both_results() {
        let source = RandomOutcome;
        let successes = (0..1000).filter(|_| source.next_success()).count();
        assert!(successes > 0 && successes < 1000);
    }
}
