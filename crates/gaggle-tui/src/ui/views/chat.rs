use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthChar;

use gaggle_core::models::DisplayMessage;

use crate::ui::scroll::Viewport;
use crate::ui::{theme, App, InputMode};

pub(crate) fn render_chat(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_messages(f, app, chunks[1]);
    render_input(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let Some(room) = app.room.as_ref() else {
        return;
    };
    let nickname = app
        .session
        .identity()
        .map(|i| i.nickname.clone())
        .unwrap_or_else(|| "…".to_string());

    let title = Line::from(vec![
        Span::styled(
            room.name.clone(),
            Style::default()
                .fg(theme::TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  online: {}", app.online_peer_count()),
            Style::default().fg(theme::ACCENT_SUCCESS),
        ),
        Span::styled(
            format!("  as {nickname}"),
            Style::default().fg(theme::TEXT_MUTED),
        ),
    ]);
    let ticket = Line::from(Span::styled(
        format!("ticket: {}", room.ticket),
        Style::default().fg(theme::TEXT_DIM),
    ));
    f.render_widget(Paragraph::new(vec![title, ticket]), area);
}

fn render_messages(f: &mut Frame, app: &mut App, area: Rect) {
    let messages = app.session.messages();
    let width = area.width.saturating_sub(1) as usize;

    let mut lines: Vec<Line> = Vec::new();
    if app.session.is_loading_more() {
        lines.push(Line::from(Span::styled(
            "Loading older messages…",
            Style::default()
                .fg(theme::TEXT_MUTED)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines.extend(message_lines(&messages, width));

    if messages.is_empty() && !app.session.is_loading_more() {
        let empty = Paragraph::new("No messages yet. Type below and press Enter.")
            .style(Style::default().fg(theme::TEXT_MUTED));
        f.render_widget(empty, area);
        app.last_viewport = Viewport {
            total_rows: 0,
            height: area.height as usize,
        };
        app.scroll
            .observe(app.last_viewport, app.session.is_loading_more(), 0, Instant::now());
        return;
    }

    let viewport = Viewport {
        total_rows: lines.len(),
        height: area.height as usize,
    };
    // Scroll bookkeeping happens against the freshly laid-out content, in
    // the same pass that draws it - corrections are never visible.
    app.scroll.observe(
        viewport,
        app.session.is_loading_more(),
        messages.len(),
        Instant::now(),
    );
    app.last_viewport = viewport;

    let scroll = app.scroll.offset().min(u16::MAX as usize) as u16;
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let (border_color, hint) = match app.input_mode {
        InputMode::Editing => (theme::BORDER_ACTIVE, " Enter to send · Esc for normal mode "),
        InputMode::Normal => (
            theme::BORDER_INACTIVE,
            " i to type · p peers · e event log · q to leave ",
        ),
    };

    let mut content = vec![Span::styled(
        app.chat_input.clone(),
        Style::default().fg(theme::TEXT_PRIMARY),
    )];
    if app.input_mode == InputMode::Editing {
        content.push(Span::styled("▌", Style::default().fg(theme::ACCENT_PRIMARY)));
    }

    let input = Paragraph::new(Line::from(content))
        .style(Style::default().bg(theme::BG_INPUT))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(Span::styled(hint, Style::default().fg(theme::TEXT_DIM))),
        );
    f.render_widget(input, area);
}

/// Lay the merged timeline out as terminal rows: an author line, the
/// wrapped content, and a spacer per message. Explicit wrapping keeps the
/// row count exact, which the scroll anchoring depends on.
pub(crate) fn message_lines(messages: &[DisplayMessage], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::with_capacity(messages.len() * 3);
    let content_width = width.saturating_sub(2);

    for msg in messages {
        let accent = if msg.is_mine {
            theme::ACCENT_SUCCESS
        } else {
            theme::user_color(&msg.from)
        };

        let author = if msg.is_mine {
            "you".to_string()
        } else {
            msg.nickname.clone()
        };
        lines.push(Line::from(vec![
            Span::styled("│ ", Style::default().fg(accent)),
            Span::styled(
                author,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", format_timestamp(msg.sent_timestamp)),
                Style::default().fg(theme::TEXT_MUTED),
            ),
        ]));

        for chunk in wrap_text(&msg.text, content_width) {
            lines.push(Line::from(vec![
                Span::styled("│ ", Style::default().fg(accent)),
                Span::styled(chunk, Style::default().fg(theme::TEXT_PRIMARY)),
            ]));
        }

        lines.push(Line::from(""));
    }
    lines
}

/// Greedy word wrap by display width; words wider than the line are split.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in raw.split(' ') {
            let word_width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();

            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }

            if word_width <= width {
                current.push_str(word);
                current_width += word_width;
            } else {
                // Break an over-long word across as many lines as needed
                for c in word.chars() {
                    let w = c.width().unwrap_or(0);
                    if current_width + w > width {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0;
                    }
                    current.push(c);
                    current_width += w;
                }
            }
        }
        lines.push(current);
    }
    lines
}

fn format_timestamp(micros: i64) -> String {
    chrono::DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}
