//! Envelope - キューに積まれる 1 件のメッセージ
//!
//! payload に lock フラグと有効期限を付けた“運搬用”データ。

use chrono::{DateTime, Utc};

use super::ids::EnvelopeId;

/// One unit of queued work.
///
/// The engine is the only writer of `locked`; handlers only ever see the
/// serialized form produced by [`Envelope::wire`].
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    id: EnvelopeId,
    payload: serde_json::Value,
    locked: bool,
    expiry_time: DateTime<Utc>,
}

impl Envelope {
    pub fn new(payload: serde_json::Value, expiry_time: DateTime<Utc>) -> Self {
        Self {
            id: EnvelopeId::generate(),
            payload,
            locked: false,
            expiry_time,
        }
    }

    pub fn id(&self) -> EnvelopeId {
        self.id
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn expiry_time(&self) -> DateTime<Utc> {
        self.expiry_time
    }

    /// Expired once `now` reaches the expiry timestamp.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Serialized form handed to patterns and handlers.
    ///
    /// `{"locked":..,"expiryTime":<epoch millis>,"payload":..}`
    pub fn wire(&self) -> String {
        serde_json::json!({
            "locked": self.locked,
            "expiryTime": self.expiry_time.timestamp_millis(),
            "payload": self.payload,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn new_envelope_is_unlocked() {
        let env = Envelope::new(serde_json::json!({"messageId": "abc1"}), at(15));
        assert!(!env.is_locked());
        assert_eq!(env.payload()["messageId"], "abc1");
    }

    #[test]
    fn expiry_is_inclusive() {
        let env = Envelope::new(serde_json::json!({}), at(10));
        assert!(!env.is_expired_at(at(9)));
        assert!(env.is_expired_at(at(10)));
        assert!(env.is_expired_at(at(10) + Duration::milliseconds(1)));
    }

    #[test]
    fn wire_reflects_lock_state() {
        let mut env = Envelope::new(serde_json::json!({"id": "xyz1"}), at(0));
        let v: serde_json::Value = serde_json::from_str(&env.wire()).unwrap();
        assert_eq!(v["locked"], false);
        assert_eq!(v["payload"]["id"], "xyz1");
        assert_eq!(v["expiryTime"], at(0).timestamp_millis());

        env.lock();
        let v: serde_json::Value = serde_json::from_str(&env.wire()).unwrap();
        assert_eq!(v["locked"], true);

        env.unlock();
        assert!(!env.is_locked());
    }
}
