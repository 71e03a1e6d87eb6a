use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::constants::DEFAULT_NICKNAME;
use crate::error::SendError;
use crate::events::LiveMessage;
use crate::models::{now_micros, DisplayMessage, StoredMessage};
use crate::net::ChatTransport;
use crate::reconcile::{merge, Outbox, OutboxMessage};
use crate::store::PageSource;
use crate::timeline::{PageOutcome, PageRequest, Timeline};

/// Local node identity, fetched once per room entry and cached. Until it
/// resolves, no message renders as mine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub node_id: String,
    pub nickname: String,
}

/// Completions of the session's asynchronous work, delivered back to the
/// event loop and fed into `handle_event`.
#[derive(Debug)]
pub enum SessionEvent {
    PageLoaded {
        request: PageRequest,
        result: Result<Vec<StoredMessage>>,
    },
    SendFinished {
        display_id: String,
        result: Result<(), SendError>,
    },
    IdentityResolved(LocalIdentity),
    IdentityFailed(String),
    LiveStoreFailed(String),
}

/// Owns the timeline, the outbox and the cached identity for the active
/// room, and drives the page source and transport on the tokio runtime.
/// All state mutation happens in `handle_event` on the caller's loop;
/// spawned tasks only ever report back through the channel, so a room
/// switch mid-flight cannot corrupt the new room's state.
pub struct ChatSession {
    source: Arc<dyn PageSource>,
    transport: Option<Arc<dyn ChatTransport>>,
    timeline: Timeline,
    outbox: Outbox,
    identity: Option<LocalIdentity>,
    events_tx: UnboundedSender<SessionEvent>,
}

impl ChatSession {
    pub fn new(source: Arc<dyn PageSource>) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                source,
                transport: None,
                timeline: Timeline::new(),
                outbox: Outbox::default(),
                identity: None,
                events_tx,
            },
            events_rx,
        )
    }

    /// Enter a room: wholesale reset of timeline and outbox, then the
    /// initial page fetch and the identity lookup.
    pub fn attach_room(&mut self, transport: Arc<dyn ChatTransport>, conversation_id: &str) {
        self.transport = Some(transport.clone());
        self.outbox.clear();
        self.identity = None;
        let request = self.timeline.reset(conversation_id);
        self.spawn_fetch(request);
        self.spawn_identity_fetch(transport);
    }

    /// Leave the room. In-flight fetch results become stale via the
    /// timeline epoch and are dropped when they land.
    pub fn detach(&mut self) {
        self.transport = None;
        self.timeline.clear();
        self.outbox.clear();
    }

    /// Trigger a backfill of the next older page. No-op while loading,
    /// after exhaustion, or outside a room.
    pub fn load_older(&mut self) {
        if let Some(request) = self.timeline.request_older() {
            self.spawn_fetch(request);
        }
    }

    /// Optimistically submit a message: it appears in the merged timeline
    /// immediately, then is persisted and transmitted in the background.
    /// Failure of either stage retracts it again via `SendFinished`.
    pub fn submit(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        anyhow::ensure!(!text.is_empty(), "cannot send an empty message");

        let conversation_id = self
            .timeline
            .conversation_id()
            .ok_or_else(|| anyhow!("not currently in a room"))?
            .to_string();
        let transport = self
            .transport
            .clone()
            .ok_or_else(|| anyhow!("not currently in a room"))?;
        let identity = self
            .identity
            .clone()
            .ok_or_else(|| anyhow!("identity not resolved yet"))?;

        let entry = OutboxMessage::new(&identity.node_id, &identity.nickname, text, now_micros());
        let stored = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id,
            sender_id: entry.from.clone(),
            nickname: entry.nickname.clone(),
            content: entry.text.clone(),
            created_at: entry.sent_timestamp,
        };
        let display_id = entry.display_id.clone();
        self.outbox.push(entry);

        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let text_out = stored.content.clone();
            let result = async {
                tokio::task::spawn_blocking(move || source.append(&stored))
                    .await
                    .map_err(|e| SendError::Persistence(anyhow!("store task failed: {e}")))?
                    .map_err(SendError::Persistence)?;
                transport
                    .send(text_out)
                    .await
                    .map_err(SendError::Transmission)?;
                Ok(())
            }
            .await;
            let _ = tx.send(SessionEvent::SendFinished { display_id, result });
        });
        Ok(())
    }

    /// A live network delivery: append to the visible timeline right away
    /// and persist in the background so it survives restarts.
    pub fn message_received(&mut self, live: &LiveMessage) {
        let Some(conversation_id) = self.timeline.conversation_id() else {
            return;
        };
        let stored = StoredMessage::from_live(live, conversation_id);
        self.timeline.append_live(stored.clone());

        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = source.append(&stored) {
                let _ = tx.send(SessionEvent::LiveStoreFailed(e.to_string()));
            }
        });
    }

    /// Apply a completion. Returns user-facing error text when the event
    /// warrants a notification (exactly one per failed attempt).
    pub fn handle_event(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::PageLoaded { request, result } => {
                match self.timeline.apply(&request, result) {
                    PageOutcome::Failed(e) => Some(format!("Error loading messages: {e}")),
                    PageOutcome::Applied | PageOutcome::Stale => None,
                }
            }
            SessionEvent::SendFinished { display_id, result } => match result {
                Ok(()) => None,
                Err(e) => {
                    // Best effort: the entry may already be gone after a
                    // room switch, but the user still hears about it.
                    self.outbox.retract(&display_id);
                    Some(e.to_string())
                }
            },
            SessionEvent::IdentityResolved(identity) => {
                tracing::debug!(node_id = %identity.node_id, "identity resolved");
                self.identity = Some(identity);
                None
            }
            SessionEvent::IdentityFailed(e) => Some(format!("Failed to fetch identity: {e}")),
            SessionEvent::LiveStoreFailed(e) => Some(format!("Error saving message: {e}")),
        }
    }

    /// The merged, render-ready timeline.
    pub fn messages(&self) -> Vec<DisplayMessage> {
        merge(
            self.timeline.items(),
            self.outbox.pending(),
            self.identity.as_ref().map(|i| i.node_id.as_str()),
        )
    }

    pub fn is_loading_more(&self) -> bool {
        self.timeline.is_loading()
    }

    pub fn has_more_old_messages(&self) -> bool {
        self.timeline.has_more()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.timeline.conversation_id()
    }

    pub fn identity(&self) -> Option<&LocalIdentity> {
        self.identity.as_ref()
    }

    /// Refresh the cached nickname after a successful rename.
    pub fn set_local_nickname(&mut self, nickname: &str) {
        if let Some(identity) = self.identity.as_mut() {
            identity.nickname = nickname.to_string();
        }
    }

    fn spawn_fetch(&self, request: PageRequest) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = source.fetch_page(&request.conversation_id, request.page, request.limit);
            let _ = tx.send(SessionEvent::PageLoaded { request, result });
        });
    }

    fn spawn_identity_fetch(&self, transport: Arc<dyn ChatTransport>) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let resolved = async {
                let node_id = transport.node_id().await?;
                let nickname = transport
                    .nickname()
                    .await?
                    .unwrap_or_else(|| DEFAULT_NICKNAME.to_string());
                Ok::<_, anyhow::Error>(LocalIdentity { node_id, nickname })
            }
            .await;
            let _ = tx.send(match resolved {
                Ok(identity) => SessionEvent::IdentityResolved(identity),
                Err(e) => SessionEvent::IdentityFailed(e.to_string()),
            });
        });
    }
}
