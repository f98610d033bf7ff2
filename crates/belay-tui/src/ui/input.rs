//! Input line
//!
//! Displays the input buffer with cursor.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::InputState;

const PROMPT_WIDTH: u16 = 3; // border + "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, input: &InputState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let paragraph = Paragraph::new(format!("> {}", input.buffer()))
        .style(Style::default().fg(Color::White))
        .block(block);

    frame.render_widget(paragraph, area);

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = u16::try_from(input.cursor()).unwrap_or(u16::MAX).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
