use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use gaggle_core::net::PeerStatus;

use crate::ui::{theme, App};

/// Centered overlay with the room roster: status dot, nickname, last-seen.
pub(crate) fn render_peers(f: &mut Frame, app: &App) {
    let area = centered_rect(f.area(), 50, 50);
    f.render_widget(Clear, area);

    let lines: Vec<Line> = if app.peers.is_empty() {
        vec![Line::from(Span::styled(
            "Nobody else here yet.",
            Style::default().fg(theme::TEXT_MUTED),
        ))]
    } else {
        app.peers
            .iter()
            .map(|peer| {
                let (dot, color) = match peer.status {
                    PeerStatus::Online => ("●", theme::ACCENT_SUCCESS),
                    PeerStatus::Away => ("●", theme::ACCENT_WARNING),
                    PeerStatus::Offline => ("●", theme::ACCENT_ERROR),
                };
                let last_seen = chrono::DateTime::from_timestamp_micros(peer.last_seen)
                    .map(|dt| {
                        dt.with_timezone(&chrono::Local)
                            .format("%H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_else(|| "-".to_string());
                Line::from(vec![
                    Span::styled(format!(" {dot} "), Style::default().fg(color)),
                    Span::styled(
                        format!("{:<20}", peer.nickname),
                        Style::default()
                            .fg(theme::TEXT_PRIMARY)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(last_seen, Style::default().fg(theme::TEXT_DIM)),
                ])
            })
            .collect()
    };

    let roster = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER_ACTIVE))
            .title(Span::styled(
                " Peers (Esc closes) ",
                Style::default().fg(theme::TEXT_PRIMARY),
            )),
    );
    f.render_widget(roster, area);
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
