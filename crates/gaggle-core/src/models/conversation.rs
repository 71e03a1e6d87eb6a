/// A chat room the user has visited. Created on first entry, deleted only
/// by explicit user action (which cascades to its messages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Stable id derived from the room topic
    pub id: String,
    pub name: String,
    /// Microseconds since epoch of the last persisted append, if any
    pub last_message_at: Option<i64>,
}
