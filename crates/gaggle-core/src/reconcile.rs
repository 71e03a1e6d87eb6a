use uuid::Uuid;

use crate::models::{DisplayMessage, MessageOrigin, StoredMessage};

/// A locally authored message shown before its persistence/transmission
/// outcome is known. The display id is a fresh local identifier, never a
/// storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    pub display_id: String,
    pub from: String,
    pub nickname: String,
    pub text: String,
    pub sent_timestamp: i64,
}

impl OutboxMessage {
    pub fn new(from: &str, nickname: &str, text: &str, sent_timestamp: i64) -> Self {
        Self {
            display_id: format!("local-{}", Uuid::new_v4()),
            from: from.to_string(),
            nickname: nickname.to_string(),
            text: text.to_string(),
            sent_timestamp,
        }
    }
}

/// Optimistic entries awaiting an outcome. Append-only until a submit
/// fails (exact-match retraction) or the conversation changes.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<OutboxMessage>,
}

impl Outbox {
    pub fn push(&mut self, message: OutboxMessage) {
        self.pending.push(message);
    }

    /// Remove the entry with exactly this display id. Returns false when
    /// no such entry is pending (e.g. it was cleared by a room switch).
    pub fn retract(&mut self, display_id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|m| m.display_id != display_id);
        before != self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &[OutboxMessage] {
        &self.pending
    }
}

/// Merge persisted/live history with optimistic sends into one
/// render-ready sequence: ascending sentTimestamp, ties resolved
/// optimistic-before-remote so a confirmation arriving with an equal
/// stamp cannot make the bubble jump. An optimistic entry whose
/// (sender, text, timestamp) already appears in history is suppressed;
/// the confirmed copy supersedes it.
///
/// `local_node_id` is None until the identity lookup resolves; every
/// message renders as not-mine until then.
pub fn merge(
    history: &[StoredMessage],
    pending: &[OutboxMessage],
    local_node_id: Option<&str>,
) -> Vec<DisplayMessage> {
    let is_mine = |from: &str| local_node_id.is_some_and(|id| id == from);

    let mut merged: Vec<DisplayMessage> = pending
        .iter()
        .filter(|p| {
            !history.iter().any(|h| {
                h.sender_id == p.from && h.content == p.text && h.created_at == p.sent_timestamp
            })
        })
        .map(|p| DisplayMessage {
            display_id: p.display_id.clone(),
            from: p.from.clone(),
            nickname: p.nickname.clone(),
            text: p.text.clone(),
            sent_timestamp: p.sent_timestamp,
            is_mine: is_mine(&p.from),
            origin: MessageOrigin::Local,
        })
        .collect();

    merged.extend(history.iter().map(|h| DisplayMessage {
        display_id: format!("remote-{}", h.id),
        from: h.sender_id.clone(),
        nickname: h.nickname.clone(),
        text: h.content.clone(),
        sent_timestamp: h.created_at,
        is_mine: is_mine(&h.sender_id),
        origin: MessageOrigin::Remote,
    }));

    // Stable sort: equal (timestamp, origin) keeps insertion order
    merged.sort_by_key(|m| (m.sent_timestamp, m.origin));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, sender: &str, text: &str, at: i64) -> StoredMessage {
        StoredMessage {
            id: id.to_string(),
            conversation_id: "room".to_string(),
            sender_id: sender.to_string(),
            nickname: sender.to_string(),
            content: text.to_string(),
            created_at: at,
        }
    }

    #[test]
    fn test_merge_sorts_by_timestamp() {
        let history = vec![
            stored("a", "peer", "first", 100),
            stored("b", "peer", "third", 300),
        ];
        let pending = vec![OutboxMessage::new("me", "Me", "second", 200)];

        let merged = merge(&history, &pending, Some("me"));
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert!(merged[1].is_mine);
        assert!(!merged[0].is_mine);
    }

    /// Equal timestamps: the optimistic entry sorts before the remote
    /// one. Strictly earlier remote stamps still win.
    #[test]
    fn test_tie_breaks_optimistic_first_but_strict_order_wins() {
        let pending = vec![OutboxMessage::new("me", "Me", "mine", 200)];

        let tie = vec![stored("a", "peer", "theirs", 200)];
        let merged = merge(&tie, &pending, Some("me"));
        assert_eq!(merged[0].origin, MessageOrigin::Local);
        assert_eq!(merged[1].origin, MessageOrigin::Remote);

        let earlier = vec![stored("a", "peer", "theirs", 199)];
        let merged = merge(&earlier, &pending, Some("me"));
        assert_eq!(merged[0].text, "theirs");
        assert_eq!(merged[1].text, "mine");
    }

    #[test]
    fn test_confirmed_copy_supersedes_optimistic_entry() {
        let pending = vec![OutboxMessage::new("me", "Me", "hello", 500)];
        // The send was echoed back and persisted with the same stamp
        let history = vec![stored("a", "me", "hello", 500)];

        let merged = merge(&history, &pending, Some("me"));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin, MessageOrigin::Remote);
        assert!(merged[0].is_mine);
    }

    #[test]
    fn test_same_text_different_stamp_is_not_deduplicated() {
        let pending = vec![OutboxMessage::new("me", "Me", "hello", 500)];
        let history = vec![stored("a", "me", "hello", 499)];
        assert_eq!(merge(&history, &pending, Some("me")).len(), 2);
    }

    #[test]
    fn test_unresolved_identity_renders_not_mine() {
        let pending = vec![OutboxMessage::new("me", "Me", "hello", 500)];
        let history = vec![stored("a", "me", "earlier", 400)];

        let merged = merge(&history, &pending, None);
        assert!(merged.iter().all(|m| !m.is_mine));
        // Order is still deterministic
        assert_eq!(merged[0].text, "earlier");
    }

    #[test]
    fn test_display_ids_are_stable_and_disjoint() {
        let pending = vec![OutboxMessage::new("me", "Me", "hello", 500)];
        let history = vec![stored("a", "peer", "hi", 400)];

        let first = merge(&history, &pending, Some("me"));
        let second = merge(&history, &pending, Some("me"));
        assert_eq!(first, second);
        assert!(first[0].display_id.starts_with("remote-"));
        assert!(first[1].display_id.starts_with("local-"));
    }

    #[test]
    fn test_retract_is_exact_match_only() {
        let mut outbox = Outbox::default();
        let a = OutboxMessage::new("me", "Me", "one", 1);
        let b = OutboxMessage::new("me", "Me", "two", 2);
        let a_id = a.display_id.clone();
        outbox.push(a);
        outbox.push(b);

        assert!(outbox.retract(&a_id));
        assert_eq!(outbox.pending().len(), 1);
        assert_eq!(outbox.pending()[0].text, "two");
        // Retracting again is a no-op
        assert!(!outbox.retract(&a_id));
    }
}
