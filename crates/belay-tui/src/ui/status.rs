//! Status bar
//!
//! Connection state, mounted room, the connection banner, and the last
//! status message.

use belay_client::ConnectionState;
use belay_core::Environment;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ChatProvider;

/// Render the status bar.
pub fn render<E: Environment>(frame: &mut Frame, provider: &ChatProvider<E>, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    match (provider.connection_state(), provider.room_id()) {
        (Some(state), Some(room_id)) => {
            spans.push(Span::styled(state.label(), state_style(state)));
            let count = provider.log().map_or(0, belay_client::MessageLog::len);
            spans.push(Span::raw(format!(" | room {room_id} | {count} messages")));
        },
        _ => spans.push(Span::raw("no room")),
    }

    if let Some(banner) = provider.banner() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(banner.to_string(), Style::default().fg(Color::Yellow)));
    }

    if let Some(status) = provider.status_message() {
        spans.push(Span::raw(" | "));
        spans.push(Span::raw(status.to_string()));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn state_style(state: ConnectionState) -> Style {
    match state {
        ConnectionState::Open => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ConnectionState::Connecting | ConnectionState::Reconnecting => {
            Style::default().fg(Color::Yellow)
        },
        ConnectionState::Idle | ConnectionState::Closed => Style::default().fg(Color::Red),
    }
}
