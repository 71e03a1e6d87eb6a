use uuid::Uuid;

use crate::events::LiveMessage;

/// A persisted chat message. Immutable once created; only ever written
/// through `PageSource::append` and removed via conversation cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub nickname: String,
    pub content: String,
    /// Microseconds since the Unix epoch. Monotonic enough for ordering,
    /// not guaranteed unique.
    pub created_at: i64,
}

impl StoredMessage {
    /// Build a storable row from a network delivery.
    pub fn from_live(live: &LiveMessage, conversation_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: live.from.clone(),
            nickname: live.nickname.clone(),
            content: live.text.clone(),
            created_at: live.sent_timestamp,
        }
    }

}

/// Current time in microseconds since the Unix epoch
pub fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}
