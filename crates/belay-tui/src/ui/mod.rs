//! UI rendering
//!
//! Rendering functions that convert provider state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod input;
mod status;

use belay_core::Environment;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::{ChatProvider, InputState};

/// Render the entire UI.
pub fn render<E: Environment>(frame: &mut Frame, provider: &ChatProvider<E>, input: &InputState) {
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [chat_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, provider, *chat_area);
    input::render(frame, input, *input_area);
    status::render(frame, provider, *status_area);
}
