//! Input state and key handling for the TUI.
//!
//! This module owns all text input state (buffer, cursor) and handles
//! character-level key events. Submitted lines are handed to the provider,
//! which parses `/commands`. The draft stays put until the provider accepts
//! the line.

use belay_app::AppEvent;
use belay_proto::MAX_MESSAGE_CHARS;

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// Input state for the TUI.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    /// Cursor position in characters, `0..=chars`.
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Current cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Empty the buffer once the submitted line was accepted.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Handle a key input event.
    ///
    /// Returns the event for the provider, or `None` if the key did nothing.
    /// Typing stops at [`MAX_MESSAGE_CHARS`] and a blank line is never
    /// submitted.
    pub fn handle_key(&mut self, key: KeyInput) -> Option<AppEvent> {
        match key {
            KeyInput::Char(c) => {
                if self.char_count() >= MAX_MESSAGE_CHARS {
                    return None;
                }
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.buffer.remove(at);
            },
            KeyInput::Delete => {
                if self.cursor >= self.char_count() {
                    return None;
                }
                let at = self.byte_index(self.cursor);
                self.buffer.remove(at);
            },
            KeyInput::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            KeyInput::Home => self.cursor = 0,
            KeyInput::End => self.cursor = self.char_count(),
            KeyInput::Enter => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                return Some(AppEvent::Submit(self.buffer.clone()));
            },
            KeyInput::Esc => return Some(AppEvent::Quit),
        }

        Some(AppEvent::Redraw)
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputState {
        let mut input = InputState::new();
        for c in text.chars() {
            input.handle_key(KeyInput::Char(c));
        }
        input
    }

    #[test]
    fn typing_appends_and_redraws() {
        let mut input = typed("he");
        assert!(matches!(input.handle_key(KeyInput::Char('y')), Some(AppEvent::Redraw)));
        assert_eq!(input.buffer(), "hey");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn enter_submits_and_keeps_draft_until_cleared() {
        let mut input = typed("send it");

        let event = input.handle_key(KeyInput::Enter);

        assert!(matches!(event, Some(AppEvent::Submit(ref text)) if text == "send it"));
        assert_eq!(input.buffer(), "send it");

        input.clear();
        assert_eq!(input.buffer(), "");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn blank_enter_submits_nothing() {
        assert!(InputState::new().handle_key(KeyInput::Enter).is_none());
        assert!(typed("   ").handle_key(KeyInput::Enter).is_none());
    }

    #[test]
    fn typing_stops_at_message_limit() {
        let mut input = typed(&"a".repeat(MAX_MESSAGE_CHARS + 1));
        assert_eq!(input.buffer().chars().count(), MAX_MESSAGE_CHARS);
        assert!(input.handle_key(KeyInput::Char('b')).is_none());

        input.handle_key(KeyInput::Backspace);
        assert!(matches!(input.handle_key(KeyInput::Char('ü')), Some(AppEvent::Redraw)));
        assert_eq!(input.buffer().chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn editing_multibyte_text() {
        let mut input = typed("crüx");
        input.handle_key(KeyInput::Left);
        input.handle_key(KeyInput::Backspace);
        assert_eq!(input.buffer(), "crx");

        input.handle_key(KeyInput::Char('ø'));
        input.handle_key(KeyInput::Home);
        input.handle_key(KeyInput::Delete);
        assert_eq!(input.buffer(), "røx");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn edges_are_no_ops() {
        let mut input = typed("ab");
        assert!(input.handle_key(KeyInput::Delete).is_none());
        input.handle_key(KeyInput::Right);
        assert_eq!(input.cursor(), 2);

        input.handle_key(KeyInput::Home);
        assert!(input.handle_key(KeyInput::Backspace).is_none());
        input.handle_key(KeyInput::End);
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn escape_quits() {
        assert!(matches!(InputState::new().handle_key(KeyInput::Esc), Some(AppEvent::Quit)));
    }
}
