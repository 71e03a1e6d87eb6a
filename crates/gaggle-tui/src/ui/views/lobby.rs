use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::{theme, App, LobbyField};

pub(crate) fn render_lobby(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(60),
            Constraint::Min(10),
        ])
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(4),
        ])
        .split(outer[1]);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "gaggle",
            Style::default()
                .fg(theme::ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  gossip chat in the terminal",
            Style::default().fg(theme::TEXT_MUTED),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    render_field(
        f,
        chunks[1],
        "Nickname",
        &app.nickname_input,
        app.lobby_field == LobbyField::Nickname,
    );
    render_field(
        f,
        chunks[2],
        "Ticket (leave empty to create a room)",
        &app.ticket_input,
        app.lobby_field == LobbyField::Ticket,
    );

    let hint = if app.joining {
        Span::styled("Joining…", Style::default().fg(theme::ACCENT_WARNING))
    } else {
        Span::styled(
            "Tab switches fields · Enter joins · ↑/↓ pick a past room · Ctrl+D deletes it",
            Style::default().fg(theme::TEXT_DIM),
        )
    };
    f.render_widget(Paragraph::new(Line::from(hint)).alignment(Alignment::Center), chunks[3]);

    render_visited(f, app, chunks[4]);
}

fn render_field(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let border = if focused {
        theme::BORDER_ACTIVE
    } else {
        theme::BORDER_INACTIVE
    };
    let mut spans = vec![Span::styled(
        value.to_string(),
        Style::default().fg(theme::TEXT_PRIMARY),
    )];
    if focused {
        spans.push(Span::styled("▌", Style::default().fg(theme::ACCENT_PRIMARY)));
    }
    let field = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme::BG_INPUT))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(Span::styled(
                    format!(" {label} "),
                    Style::default().fg(theme::TEXT_MUTED),
                )),
        );
    f.render_widget(field, area);
}

fn render_visited(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .conversations
        .iter()
        .enumerate()
        .map(|(i, conversation)| {
            let selected = i == app.lobby_selected;
            let style = if selected {
                Style::default()
                    .fg(theme::TEXT_PRIMARY)
                    .bg(theme::BG_SELECTED)
            } else {
                Style::default().fg(theme::TEXT_MUTED)
            };
            let activity = conversation
                .last_message_at
                .and_then(chrono::DateTime::from_timestamp_micros)
                .map(|dt| {
                    dt.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_else(|| "no messages".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<24}", conversation.name), style),
                Span::styled(format!("  {activity}"), Style::default().fg(theme::TEXT_DIM)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme::BORDER_INACTIVE))
            .title(Span::styled(
                " Past rooms (history only - rejoin needs a ticket) ",
                Style::default().fg(theme::TEXT_MUTED),
            )),
    );
    f.render_widget(list, area);
}
