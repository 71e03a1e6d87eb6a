use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::views::{render_chat, render_event_log, render_lobby, render_peers};
use crate::ui::{theme, App, View};

pub fn render(f: &mut Frame, app: &mut App) {
    match app.view {
        View::Lobby => render_lobby(f, app),
        View::Chat => render_chat(f, app),
    }

    if app.show_event_log {
        render_event_log(f, app);
    }
    if app.show_peers {
        render_peers(f, app);
    }

    render_toast(f, app);
}

/// The current toast, drawn over the bottom row.
fn render_toast(f: &mut Frame, app: &App) {
    let Some(notification) = app.notifications.current() else {
        return;
    };
    let color = match notification.level {
        crate::ui::notifications::NotificationLevel::Info => theme::ACCENT_PRIMARY,
        crate::ui::notifications::NotificationLevel::Error => theme::ACCENT_ERROR,
    };
    let area = f.area();
    let row = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };
    let toast = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", notification.level.icon()), Style::default().fg(color)),
        Span::styled(notification.message.clone(), Style::default().fg(color)),
    ]));
    f.render_widget(toast, row);
}
