//! MessageHandler port - メッセージを処理する capability
//!
//! エンジンから見ると handler は不透明な非同期処理であり、
//! 成功/失敗のどちらも、どんな遅延でも返しうる（タイムアウトなし）。

use async_trait::async_trait;

use crate::domain::MatchPattern;
use crate::error::HandlerError;

/// A named worker able to attempt processing of one envelope.
///
/// `receive` gets the serialized envelope (see `Envelope::wire`). An `Err`
/// means the attempt failed; the engine decides whether to retry.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Optional predicate over the serialized envelope.
    fn pattern(&self) -> Option<&MatchPattern> {
        None
    }

    async fn receive(&self, message: &str) -> Result<(), HandlerError>;

    /// No pattern accepts everything.
    fn accepts(&self, wire: &str) -> bool {
        self.pattern().is_none_or(|p| p.is_match(wire))
    }
}
