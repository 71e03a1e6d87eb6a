use serde::{Deserialize, Serialize};

/// A message as delivered by the gossip transport. Transient: it only
/// becomes part of history once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMessage {
    pub from: String,
    pub nickname: String,
    pub text: String,
    /// Microseconds since the Unix epoch, stamped by the sender
    pub sent_timestamp: i64,
}

/// Events emitted by an active room subscription. The wire shape is an
/// internally-tagged camelCase object, matching what the transport emits.
/// Only `MessageReceived` feeds the timeline; the rest go to the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    Joined {
        neighbors: Vec<String>,
    },
    MessageReceived(LiveMessage),
    #[serde(rename_all = "camelCase")]
    Presence {
        from: String,
        nickname: String,
        sent_timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    NeighborUp {
        node_id: String,
    },
    #[serde(rename_all = "camelCase")]
    NeighborDown {
        node_id: String,
    },
    Lagged,
    Errored {
        message: String,
    },
}

impl ChatEvent {
    /// Short label used by the event log view
    pub fn label(&self) -> &'static str {
        match self {
            ChatEvent::Joined { .. } => "joined",
            ChatEvent::MessageReceived(_) => "messageReceived",
            ChatEvent::Presence { .. } => "presence",
            ChatEvent::NeighborUp { .. } => "neighborUp",
            ChatEvent::NeighborDown { .. } => "neighborDown",
            ChatEvent::Lagged => "lagged",
            ChatEvent::Errored { .. } => "errored",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_received_wire_shape() {
        let event = ChatEvent::MessageReceived(LiveMessage {
            from: "ab12".into(),
            nickname: "ada".into(),
            text: "hi".into(),
            sent_timestamp: 1_700_000_000_000_000,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "messageReceived");
        assert_eq!(json["from"], "ab12");
        assert_eq!(json["sentTimestamp"], 1_700_000_000_000_000i64);
    }

    #[test]
    fn test_neighbor_events_round_trip() {
        let up = ChatEvent::NeighborUp {
            node_id: "n1".into(),
        };
        let json = serde_json::to_string(&up).unwrap();
        assert!(json.contains("\"nodeId\""));
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, up);
    }
}
