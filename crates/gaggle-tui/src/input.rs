use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::{App, InputMode, LobbyField, View};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.show_event_log {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('e')) {
            app.show_event_log = false;
        }
        return;
    }
    if app.show_peers {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('p')) {
            app.show_peers = false;
        }
        return;
    }

    match app.view {
        View::Lobby => handle_lobby_key(app, key),
        View::Chat => handle_chat_key(app, key),
    }
}

fn handle_lobby_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.lobby_field = match app.lobby_field {
                LobbyField::Nickname => LobbyField::Ticket,
                LobbyField::Ticket => LobbyField::Nickname,
            };
        }
        KeyCode::Enter => app.create_or_join(),
        KeyCode::Up => app.lobby_selected = app.lobby_selected.saturating_sub(1),
        KeyCode::Down => {
            if app.lobby_selected + 1 < app.conversations.len() {
                app.lobby_selected += 1;
            }
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.delete_selected_conversation();
        }
        KeyCode::Backspace => {
            lobby_input(app).pop();
        }
        KeyCode::Char(c) => {
            lobby_input(app).push(c);
        }
        _ => {}
    }
}

fn lobby_input(app: &mut App) -> &mut String {
    match app.lobby_field {
        LobbyField::Nickname => &mut app.nickname_input,
        LobbyField::Ticket => &mut app.ticket_input,
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    // Page scrolling works regardless of input mode
    let page = app.last_viewport.height.saturating_sub(1).max(1);
    match key.code {
        KeyCode::PageUp => {
            app.scroll.scroll_up(page);
            return;
        }
        KeyCode::PageDown => {
            app.scroll.scroll_down(page, app.last_viewport);
            return;
        }
        _ => {}
    }

    match app.input_mode {
        InputMode::Editing => match key.code {
            KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Enter => app.submit_chat_input(),
            KeyCode::Backspace => {
                app.chat_input.pop();
            }
            KeyCode::Char(c) => app.chat_input.push(c),
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('i') => app.input_mode = InputMode::Editing,
            KeyCode::Char('q') => app.leave_room(),
            KeyCode::Char('e') => app.show_event_log = true,
            KeyCode::Char('p') => app.show_peers = true,
            KeyCode::Up | KeyCode::Char('k') => app.scroll.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll.scroll_down(1, app.last_viewport),
            KeyCode::Char('G') => app.scroll.scroll_to_bottom(app.last_viewport),
            _ => {}
        },
    }
}
