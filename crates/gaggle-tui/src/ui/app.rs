use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

use gaggle_core::events::ChatEvent;
use gaggle_core::models::Conversation;
use gaggle_core::net::{ChatBackend, ChatTransport, PeerInfo, RoomHandle};
use gaggle_core::session::ChatSession;
use gaggle_core::store::ChatDatabase;

use crate::ui::notifications::{Notification, Notifications};
use crate::ui::scroll::{ScrollAnchor, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Lobby,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyField {
    Nickname,
    Ticket,
}

/// The room the user is currently in.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub conversation_id: String,
    pub ticket: String,
    pub name: String,
}

/// Completions of UI-initiated background work (room joins, store
/// queries, roster polls), delivered to the event loop.
pub enum UiEvent {
    RoomJoined(Result<RoomHandle>),
    Conversations(Result<Vec<Conversation>>),
    ConversationDeleted(Result<String>),
    Peers(Vec<PeerInfo>),
    NicknameChanged(Result<String>),
}

/// How many chat events the log keeps around
const EVENT_LOG_CAP: usize = 200;

pub struct App {
    pub running: bool,
    pub view: View,
    pub input_mode: InputMode,

    pub db: Arc<ChatDatabase>,
    pub backend: Arc<dyn ChatBackend>,
    pub session: ChatSession,
    pub transport: Option<Arc<dyn ChatTransport>>,
    pub room: Option<RoomInfo>,

    pub scroll: ScrollAnchor,
    /// Measured during the previous render; the tick handler uses it for
    /// the backfill trigger
    pub last_viewport: Viewport,

    pub peers: Vec<PeerInfo>,
    pub show_peers: bool,
    pub event_log: Vec<ChatEvent>,
    pub show_event_log: bool,
    pub notifications: Notifications,

    // Lobby state
    pub conversations: Vec<Conversation>,
    pub lobby_selected: usize,
    pub lobby_field: LobbyField,
    pub nickname_input: String,
    pub ticket_input: String,
    pub joining: bool,

    // Chat input
    pub chat_input: String,

    ui_tx: UnboundedSender<UiEvent>,
}

impl App {
    pub fn new(
        db: Arc<ChatDatabase>,
        backend: Arc<dyn ChatBackend>,
        session: ChatSession,
        ui_tx: UnboundedSender<UiEvent>,
        nickname: Option<String>,
    ) -> Self {
        Self {
            running: true,
            view: View::Lobby,
            input_mode: InputMode::Editing,
            db,
            backend,
            session,
            transport: None,
            room: None,
            scroll: ScrollAnchor::new(),
            last_viewport: Viewport::default(),
            peers: Vec::new(),
            show_peers: false,
            event_log: Vec::new(),
            show_event_log: false,
            notifications: Notifications::default(),
            conversations: Vec::new(),
            lobby_selected: 0,
            lobby_field: LobbyField::Nickname,
            nickname_input: nickname.unwrap_or_default(),
            ticket_input: String::new(),
            joining: false,
            chat_input: String::new(),
            ui_tx,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.notifications.push(Notification::info(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.notifications.push(Notification::error(message));
    }

    /// Refresh the lobby's visited-rooms list from the store.
    pub fn request_conversations(&self) {
        let db = self.db.clone();
        let tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(UiEvent::Conversations(db.conversations()));
        });
    }

    /// Create a room (empty ticket) or join one. The conversation row is
    /// created before the join completes so appends never race it.
    pub fn create_or_join(&mut self) {
        if self.joining {
            return;
        }
        let nickname = self.nickname_input.trim().to_string();
        if nickname.is_empty() {
            self.notify_error("Pick a nickname first");
            return;
        }
        self.joining = true;

        let ticket = self.ticket_input.trim().to_string();
        let backend = self.backend.clone();
        let db = self.db.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let joined = async {
                let handle = if ticket.is_empty() {
                    backend.create_room(nickname).await?
                } else {
                    backend.join_room(ticket, nickname).await?
                };
                let conversation_id = handle.conversation_id.clone();
                tokio::task::spawn_blocking(move || db.ensure_conversation(&conversation_id, None))
                    .await
                    .map_err(|e| anyhow::anyhow!("store task failed: {e}"))??;
                Ok(handle)
            }
            .await;
            let _ = tx.send(UiEvent::RoomJoined(joined));
        });
    }

    /// Called by the run loop once it has taken over the room's event
    /// receiver.
    pub fn enter_room(
        &mut self,
        conversation_id: String,
        ticket: String,
        transport: Arc<dyn ChatTransport>,
    ) {
        let name = self
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Chat {}", &conversation_id[..8.min(conversation_id.len())]));

        self.session.attach_room(transport.clone(), &conversation_id);
        self.scroll.reset();
        self.event_log.clear();
        self.peers.clear();
        self.transport = Some(transport);
        self.room = Some(RoomInfo {
            conversation_id,
            ticket,
            name,
        });
        self.joining = false;
        self.view = View::Chat;
        self.input_mode = InputMode::Editing;
        self.chat_input.clear();
    }

    /// Back to the lobby. The backend tears the room down; any in-flight
    /// page loads for it become stale and are discarded.
    pub fn leave_room(&mut self) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.leave_room().await {
                tracing::warn!("leave room failed: {e}");
            }
        });
        self.session.detach();
        self.transport = None;
        self.room = None;
        self.peers.clear();
        self.scroll.reset();
        self.view = View::Lobby;
        self.input_mode = InputMode::Editing;
        self.show_event_log = false;
        self.show_peers = false;
        self.request_conversations();
    }

    /// A chat event from the active room's subscription. Everything lands
    /// in the event log; only message deliveries feed the timeline.
    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        self.event_log.push(event.clone());
        if self.event_log.len() > EVENT_LOG_CAP {
            let excess = self.event_log.len() - EVENT_LOG_CAP;
            self.event_log.drain(..excess);
        }

        match event {
            ChatEvent::MessageReceived(live) => {
                self.session.message_received(&live);
            }
            ChatEvent::Joined { neighbors } => {
                for neighbor in neighbors {
                    self.notify_info(format!("{neighbor} joined the room"));
                }
            }
            ChatEvent::Errored { message } => {
                self.notify_error(message);
            }
            ChatEvent::Presence { .. }
            | ChatEvent::NeighborUp { .. }
            | ChatEvent::NeighborDown { .. }
            | ChatEvent::Lagged => {}
        }
    }

    /// Submit the chat input box: either the `/nick` command or a message.
    pub fn submit_chat_input(&mut self) {
        let text = self.chat_input.trim().to_string();
        if text.is_empty() {
            return;
        }

        if let Some(rest) = text.strip_prefix("/nick ") {
            let nickname = rest.trim().to_string();
            if nickname.is_empty() {
                self.notify_error("Usage: /nick <name>");
                return;
            }
            if let Some(transport) = self.transport.clone() {
                let tx = self.ui_tx.clone();
                tokio::spawn(async move {
                    let result = transport
                        .set_nickname(nickname.clone())
                        .await
                        .map(|_| nickname);
                    let _ = tx.send(UiEvent::NicknameChanged(result));
                });
            }
            self.chat_input.clear();
            return;
        }

        match self.session.submit(&text) {
            Ok(()) => {
                self.chat_input.clear();
                // Sending is an explicit jump to the newest message
                self.scroll.scroll_to_bottom(self.last_viewport);
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    pub fn delete_selected_conversation(&mut self) {
        let Some(conversation) = self.conversations.get(self.lobby_selected) else {
            return;
        };
        let id = conversation.id.clone();
        let db = self.db.clone();
        let tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = db.delete_conversation(&id).map(|_| id);
            let _ = tx.send(UiEvent::ConversationDeleted(result));
        });
    }

    /// Poll the roster. Failures are logged, not toasted - this runs on a
    /// timer and would spam.
    pub fn request_peers(&self) {
        let Some(transport) = self.transport.clone() else {
            return;
        };
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            match transport.peers().await {
                Ok(peers) => {
                    let _ = tx.send(UiEvent::Peers(peers));
                }
                Err(e) => tracing::debug!("peer roster fetch failed: {e}"),
            }
        });
    }

    pub fn online_peer_count(&self) -> usize {
        self.peers
            .iter()
            .filter(|p| p.status == gaggle_core::net::PeerStatus::Online)
            .count()
    }

    /// Handle every UI completion except `RoomJoined`, which the run loop
    /// intercepts to take ownership of the event receiver.
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::RoomJoined(_) => {
                // The run loop intercepts joins to take the event
                // receiver; landing here means the result was dropped
                tracing::error!("room join result reached App::handle_ui_event");
            }
            UiEvent::Conversations(Ok(conversations)) => {
                self.conversations = conversations;
                if self.lobby_selected >= self.conversations.len() {
                    self.lobby_selected = self.conversations.len().saturating_sub(1);
                }
            }
            UiEvent::Conversations(Err(e)) => {
                self.notify_error(format!("Error loading conversations: {e}"));
            }
            UiEvent::ConversationDeleted(Ok(id)) => {
                self.notify_info(format!("Deleted chat {}", &id[..8.min(id.len())]));
                self.request_conversations();
            }
            UiEvent::ConversationDeleted(Err(e)) => {
                self.notify_error(format!("Error deleting conversation: {e}"));
            }
            UiEvent::Peers(peers) => {
                self.peers = peers;
            }
            UiEvent::NicknameChanged(Ok(nickname)) => {
                self.session.set_local_nickname(&nickname);
                self.notify_info(format!("Nickname changed to {nickname}"));
            }
            UiEvent::NicknameChanged(Err(e)) => {
                self.notify_error(format!("Error changing nickname: {e}"));
            }
        }
    }

    /// Regular 50 ms heartbeat: toast expiry, follow glide, and the
    /// debounced backfill trigger against the last measured viewport.
    pub fn tick(&mut self, now: Instant) {
        self.notifications.tick(now);
        self.scroll.tick_glide(self.last_viewport);

        if self.view == View::Chat
            && self.scroll.poll_backfill(
                self.last_viewport,
                self.session.is_loading_more(),
                self.session.has_more_old_messages(),
                now,
            )
        {
            self.session.load_older();
        }
    }
}
