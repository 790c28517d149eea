//! InMemorySidelineStore - プロセス内の退避キュー
//!
//! # 実装詳細
//! - VecDeque で到着順を保持し、pop は最古の 1 件を返す
//! - 同期 Mutex で排他制御（ロックを await 越しに保持しない）

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::ports::SidelineStore;

#[derive(Debug, Default)]
pub struct InMemorySidelineStore {
    entries: Mutex<VecDeque<serde_json::Value>>,
}

impl InMemorySidelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<serde_json::Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl SidelineStore for InMemorySidelineStore {
    fn push(&self, payload: serde_json::Value) {
        info!(%payload, "adding message to sideline");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(payload);
    }

    fn push_front(&self, payload: serde_json::Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_front(payload);
    }

    fn pop(&self) -> Option<serde_json::Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pop_returns_oldest_first() {
        let store = InMemorySidelineStore::new();
        store.push(json!({"messageId": "abc5"}));
        store.push(json!({"messageId": "xyz6"}));

        assert_eq!(store.len(), 2);
        assert_eq!(store.pop(), Some(json!({"messageId": "abc5"})));
        assert_eq!(store.pop(), Some(json!({"messageId": "xyz6"})));
        assert_eq!(store.pop(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn push_front_keeps_the_head() {
        let store = InMemorySidelineStore::new();
        store.push(json!("B"));
        store.push(json!("C"));

        let head = store.pop().unwrap();
        store.push_front(head);
        assert_eq!(store.snapshot(), vec![json!("B"), json!("C")]);
    }

    #[test]
    fn snapshot_does_not_drain() {
        let store = InMemorySidelineStore::new();
        store.push(json!(1));
        assert_eq!(store.snapshot(), vec![json!(1)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_pushes_are_all_kept() {
        let store = std::sync::Arc::new(InMemorySidelineStore::new());
        let joins: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || store.push(json!(i)))
            })
            .collect();
        for j in joins {
            j.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
