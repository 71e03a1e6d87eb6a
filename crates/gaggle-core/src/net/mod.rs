mod loopback;

pub use loopback::LoopbackBackend;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::events::ChatEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerStatus {
    Online,
    Away,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    pub id: String,
    pub nickname: String,
    /// Microseconds since epoch of the last activity seen from this peer
    pub last_seen: i64,
    pub status: PeerStatus,
}

/// Per-room send/query surface of the gossip transport. Implemented
/// outside this repo (the loopback node here is a stand-in).
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, text: String) -> Result<()>;

    async fn node_id(&self) -> Result<String>;

    async fn nickname(&self) -> Result<Option<String>>;

    async fn set_nickname(&self, nickname: String) -> Result<()>;

    async fn peers(&self) -> Result<Vec<PeerInfo>>;
}

/// Everything needed to participate in one room: the conversation id
/// derived from the room topic, the serialized ticket for out-of-band
/// sharing, the send/query handle, and the event subscription.
pub struct RoomHandle {
    pub conversation_id: String,
    pub ticket: String,
    pub transport: Arc<dyn ChatTransport>,
    pub events: mpsc::UnboundedReceiver<ChatEvent>,
}

/// Room lifecycle actions. Joining or creating tears down any previously
/// active room subscription first; implementations keep at most one room
/// active per node.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn create_room(&self, nickname: String) -> Result<RoomHandle>;

    async fn join_room(&self, ticket: String, nickname: String) -> Result<RoomHandle>;

    async fn leave_room(&self) -> Result<()>;
}
