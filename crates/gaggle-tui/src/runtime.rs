use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEventKind, MouseEventKind};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

use gaggle_core::events::ChatEvent;
use gaggle_core::net::RoomHandle;
use gaggle_core::session::SessionEvent;

use crate::input::handle_key;
use crate::render::render;
use crate::ui::{App, Tui, UiEvent};

pub async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    mut session_rx: UnboundedReceiver<SessionEvent>,
    mut ui_rx: UnboundedReceiver<UiEvent>,
) -> Result<()> {
    let mut event_stream = EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));
    let mut peer_interval = tokio::time::interval(Duration::from_secs(2));

    // The active room's event subscription; replaced on every join,
    // dropped on leave
    let mut room_events: Option<UnboundedReceiver<ChatEvent>> = None;

    while app.running {
        terminal.draw(|f| render(f, app))?;

        tokio::select! {
            // Terminal input
            maybe_event = event_stream.next() => {
                if let Some(Ok(event)) = maybe_event {
                    match event {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            handle_key(app, key);
                        }
                        Event::Mouse(mouse) if app.view == crate::ui::View::Chat => {
                            match mouse.kind {
                                MouseEventKind::ScrollUp => app.scroll.scroll_up(3),
                                MouseEventKind::ScrollDown => {
                                    app.scroll.scroll_down(3, app.last_viewport);
                                }
                                _ => {}
                            }
                        }
                        Event::Paste(text) => {
                            if app.view == crate::ui::View::Chat
                                && app.input_mode == crate::ui::InputMode::Editing
                            {
                                app.chat_input.push_str(&text);
                            }
                        }
                        _ => {}
                    }
                }
            }

            // Session completions: page loads, send outcomes, identity
            Some(event) = session_rx.recv() => {
                if let Some(notice) = app.session.handle_event(event) {
                    app.notify_error(notice);
                }
            }

            // UI task completions
            Some(event) = ui_rx.recv() => {
                match event {
                    UiEvent::RoomJoined(Ok(handle)) => {
                        let RoomHandle { conversation_id, ticket, transport, events } = handle;
                        room_events = Some(events);
                        app.enter_room(conversation_id, ticket, transport);
                    }
                    UiEvent::RoomJoined(Err(e)) => {
                        app.joining = false;
                        app.notify_error(format!("Could not join room: {e}"));
                    }
                    other => app.handle_ui_event(other),
                }
            }

            // Events from the active room subscription
            event = recv_room(&mut room_events) => {
                match event {
                    Some(event) => app.handle_chat_event(event),
                    // Stream ended (room torn down); stop polling it
                    None => room_events = None,
                }
            }

            // Heartbeat: toasts, glide, debounced backfill trigger
            _ = tick_interval.tick() => {
                app.tick(Instant::now());
            }

            // Roster poll while in a room
            _ = peer_interval.tick() => {
                app.request_peers();
            }
        }
    }
    Ok(())
}

/// Waits on the room subscription when there is one, pends forever when
/// there is not (keeps the select arm inert instead of busy-looping).
async fn recv_room(rx: &mut Option<UnboundedReceiver<ChatEvent>>) -> Option<ChatEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
