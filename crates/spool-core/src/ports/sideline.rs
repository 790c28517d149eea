//! SidelineStore port - 溢れたメッセージの退避先
//!
//! lock / expiry / retry は一切持たない単純なシンク。
//! エンジンが自動で再処理することはない。

/// Overflow sink for payloads the queue could not accept.
pub trait SidelineStore: Send + Sync {
    /// Unconditional accept.
    fn push(&self, payload: serde_json::Value);

    /// Put a popped entry back at the head, ahead of everything newer.
    fn push_front(&self, payload: serde_json::Value);

    /// Remove and return the oldest entry, if any.
    fn pop(&self) -> Option<serde_json::Value>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
