use thiserror::Error;

/// Errors raised by the queue engine.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The buffer is full. `send` retries this with backoff before giving up.
    #[error("size limit exceeded (capacity={capacity})")]
    CapacityExceeded { capacity: usize },

    /// Send retries are exhausted. The payload must be routed to the sideline.
    #[error("QUEUE_OVERFLOW: unable to send message {payload}")]
    QueueOverflow { payload: serde_json::Value },

    #[error("queue requires at least one handler")]
    NoHandlers,
}

impl QueueError {
    /// Payload carried by an overflow signal, if this is one.
    pub fn into_overflow_payload(self) -> Option<serde_json::Value> {
        match self {
            QueueError::QueueOverflow { payload } => Some(payload),
            _ => None,
        }
    }
}

/// A single handler invocation rejecting.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("[{handler}] failed to process message: {reason}")]
    Rejected { handler: String, reason: String },

    #[error("[{handler}] panicked while processing message: {reason}")]
    Panicked { handler: String, reason: String },
}

impl HandlerError {
    pub fn rejected(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerError::Rejected {
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    pub fn panicked(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerError::Panicked {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_display_carries_tag_and_payload() {
        let err = QueueError::QueueOverflow {
            payload: serde_json::json!({"messageId": "abc5"}),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("QUEUE_OVERFLOW"));
        assert!(msg.contains("abc5"));
    }

    #[test]
    fn only_overflow_yields_a_payload() {
        let err = QueueError::QueueOverflow {
            payload: serde_json::json!("C"),
        };
        assert_eq!(err.into_overflow_payload(), Some(serde_json::json!("C")));
        assert!(
            QueueError::CapacityExceeded { capacity: 2 }
                .into_overflow_payload()
                .is_none()
        );
    }
}
