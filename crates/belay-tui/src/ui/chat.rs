//! Chat area
//!
//! Displays the mounted room's log, newest at the bottom. Unconfirmed sends
//! carry a trailing marker: `...` while pending, `!` once failed.

use belay_client::{LogEntry, TicketState};
use belay_core::Environment;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::ChatProvider;

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render<E: Environment>(frame: &mut Frame, provider: &ChatProvider<E>, area: Rect) {
    let title = provider
        .room_id()
        .map_or_else(|| " no room ".to_string(), |room_id| format!(" room {room_id} "));

    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = provider.log().map_or_else(
        || {
            vec![ListItem::new(Line::from(Span::styled(
                "/room <id> to join a room",
                Style::default().fg(Color::DarkGray),
            )))]
        },
        |log| log.iter().map(|entry| entry_item(entry, provider.sender_id())).collect(),
    );

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn entry_item(entry: &LogEntry, own_id: u64) -> ListItem<'static> {
    let message = entry.message();
    let sender_color = if message.is_from(own_id) { Color::Cyan } else { Color::Green };

    let mut spans = vec![
        Span::styled(
            message.sent_at.format("%H:%M").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("<{}>", message.sender_id),
            Style::default().fg(sender_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    match entry.ticket_state() {
        Some(TicketState::Pending) => {
            spans.push(Span::styled(message.message.clone(), Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(" ...", Style::default().fg(Color::DarkGray)));
        },
        Some(TicketState::Failed) => {
            spans.push(Span::raw(message.message.clone()));
            spans.push(Span::styled(" !", Style::default().fg(Color::Red)));
        },
        Some(TicketState::Confirmed) | None => spans.push(Span::raw(message.message.clone())),
    }

    ListItem::new(Line::from(spans))
}
