use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use gaggle_core::events::ChatEvent;

use crate::ui::{theme, App};

/// Centered overlay with the raw event feed, newest last.
pub(crate) fn render_event_log(f: &mut Frame, app: &App) {
    let area = centered_rect(f.area(), 80, 70);
    f.render_widget(Clear, area);

    let visible = area.height.saturating_sub(2) as usize;
    let start = app.event_log.len().saturating_sub(visible);
    let lines: Vec<Line> = app.event_log[start..]
        .iter()
        .map(|event| {
            let payload = serde_json::to_string(event).unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!("{:<16}", event.label()),
                    Style::default().fg(event_color(event)).add_modifier(Modifier::BOLD),
                ),
                Span::styled(payload, Style::default().fg(theme::TEXT_MUTED)),
            ])
        })
        .collect();

    let log = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER_ACTIVE))
            .title(Span::styled(
                " Event log (Esc closes) ",
                Style::default().fg(theme::TEXT_PRIMARY),
            )),
    );
    f.render_widget(log, area);
}

fn event_color(event: &ChatEvent) -> ratatui::style::Color {
    match event {
        ChatEvent::MessageReceived(_) => theme::ACCENT_PRIMARY,
        ChatEvent::Joined { .. } | ChatEvent::NeighborUp { .. } => theme::ACCENT_SUCCESS,
        ChatEvent::NeighborDown { .. } | ChatEvent::Lagged => theme::ACCENT_WARNING,
        ChatEvent::Errored { .. } => theme::ACCENT_ERROR,
        ChatEvent::Presence { .. } => theme::TEXT_MUTED,
    }
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
