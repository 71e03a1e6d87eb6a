use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::ChatEvent;
use crate::net::{ChatBackend, ChatTransport, PeerInfo, RoomHandle};

/// Single-node in-process backend. Joins succeed immediately with no
/// neighbors, sends are accepted without being echoed back (gossip does
/// not deliver a node's own broadcasts), and the peer roster is empty.
/// Lets the client run standalone and gives tests a real contract seam.
pub struct LoopbackBackend {
    node_id: String,
    active: Mutex<Option<LoopbackRoom>>,
}

struct LoopbackRoom {
    conversation_id: String,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl LoopbackBackend {
    pub fn new() -> Self {
        Self {
            node_id: Uuid::new_v4().simple().to_string(),
            active: Mutex::new(None),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    fn open_room(&self, topic_id: String, nickname: String) -> RoomHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        // A fresh single-node room has no neighbors yet
        let _ = events_tx.send(ChatEvent::Joined { neighbors: vec![] });

        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some(LoopbackRoom {
            conversation_id: topic_id.clone(),
            events: events_tx,
        });

        let transport = Arc::new(LoopbackTransport {
            node_id: self.node_id.clone(),
            nickname: Mutex::new(nickname),
        });

        RoomHandle {
            ticket: format!("gaggle:{topic_id}"),
            conversation_id: topic_id,
            transport,
            events: events_rx,
        }
    }
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for LoopbackBackend {
    async fn create_room(&self, nickname: String) -> Result<RoomHandle> {
        self.leave_room().await?;
        let topic_id = Uuid::new_v4().simple().to_string();
        tracing::info!(topic = %topic_id, "created loopback room");
        Ok(self.open_room(topic_id, nickname))
    }

    async fn join_room(&self, ticket: String, nickname: String) -> Result<RoomHandle> {
        self.leave_room().await?;
        let topic_id = ticket.strip_prefix("gaggle:").unwrap_or(&ticket).to_string();
        anyhow::ensure!(!topic_id.is_empty(), "ticket has no topic id");
        tracing::info!(topic = %topic_id, "joined loopback room");
        Ok(self.open_room(topic_id, nickname))
    }

    async fn leave_room(&self) -> Result<()> {
        let previous = self.active.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(room) = previous {
            // Dropping the sender ends the old room's event stream
            tracing::info!(topic = %room.conversation_id, "left loopback room");
        }
        Ok(())
    }
}

struct LoopbackTransport {
    node_id: String,
    nickname: Mutex<String>,
}

#[async_trait]
impl ChatTransport for LoopbackTransport {
    async fn send(&self, text: String) -> Result<()> {
        tracing::debug!(bytes = text.len(), "loopback send");
        Ok(())
    }

    async fn node_id(&self) -> Result<String> {
        Ok(self.node_id.clone())
    }

    async fn nickname(&self) -> Result<Option<String>> {
        Ok(Some(self.nickname.lock().unwrap_or_else(|e| e.into_inner()).clone()))
    }

    async fn set_nickname(&self, nickname: String) -> Result<()> {
        *self.nickname.lock().unwrap_or_else(|e| e.into_inner()) = nickname;
        Ok(())
    }

    async fn peers(&self) -> Result<Vec<PeerInfo>> {
        Ok(Vec::new())
    }
}

/// Inject an event into the active room, as a peer would. Test-only hook.
#[cfg(test)]
impl LoopbackBackend {
    pub(crate) fn emit(&self, event: ChatEvent) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|room| room.events.send(event).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LiveMessage;
    use crate::models::now_micros;

    #[tokio::test]
    async fn test_join_emits_joined_and_routes_events() {
        let backend = LoopbackBackend::new();
        let mut room = backend.create_room("ada".to_string()).await.unwrap();

        assert_eq!(
            room.events.recv().await,
            Some(ChatEvent::Joined { neighbors: vec![] })
        );

        let live = LiveMessage {
            from: "peer".into(),
            nickname: "bob".into(),
            text: "hello".into(),
            sent_timestamp: now_micros(),
        };
        assert!(backend.emit(ChatEvent::MessageReceived(live.clone())));
        assert_eq!(room.events.recv().await, Some(ChatEvent::MessageReceived(live)));
    }

    #[tokio::test]
    async fn test_rejoin_supersedes_previous_room() {
        let backend = LoopbackBackend::new();
        let mut first = backend.create_room("ada".to_string()).await.unwrap();
        let _ = first.events.recv().await;

        let second = backend
            .join_room(first.ticket.clone(), "ada".to_string())
            .await
            .unwrap();
        assert_eq!(first.conversation_id, second.conversation_id);

        // The first room's stream ended when its sender was dropped
        assert_eq!(first.events.recv().await, None);
    }

    #[tokio::test]
    async fn test_nickname_round_trip() {
        let backend = LoopbackBackend::new();
        let room = backend.create_room("ada".to_string()).await.unwrap();
        assert_eq!(room.transport.nickname().await.unwrap(), Some("ada".into()));

        room.transport.set_nickname("lovelace".to_string()).await.unwrap();
        assert_eq!(
            room.transport.nickname().await.unwrap(),
            Some("lovelace".into())
        );
    }
}
