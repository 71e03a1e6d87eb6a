/// Which channel a display entry came from. Used by the merge ordering
/// rule: on equal timestamps, Local sorts before Remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageOrigin {
    /// Locally authored, outcome not yet known
    Local,
    /// Persisted history or a live network delivery
    Remote,
}

/// Render-ready view of a message, derived from stored, live and
/// optimistic entries. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Stable per logical message across re-renders; `local-` and
    /// `remote-` prefixes keep the two namespaces from colliding.
    pub display_id: String,
    pub from: String,
    pub nickname: String,
    pub text: String,
    pub sent_timestamp: i64,
    pub is_mine: bool,
    pub origin: MessageOrigin,
}
