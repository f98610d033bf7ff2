//! Snapshot tests for the full terminal screen.
//!
//! Rendered into a ratatui `TestBackend` so layout changes show up as
//! reviewable diffs.

use belay_app::{AppEvent, ChatProvider, ProviderConfig};
use belay_core::{Environment, env::test_utils::ManualEnv};
use belay_proto::{ChatMessage, MessageType};
use belay_tui::{InputState, ui};
use ratatui::{Terminal, backend::TestBackend};

fn screen(provider: &ChatProvider<ManualEnv>) -> TestBackend {
    let mut terminal = Terminal::new(TestBackend::new(32, 7)).unwrap();
    terminal.draw(|frame| ui::render(frame, provider, &InputState::new())).unwrap();
    terminal.backend().clone()
}

#[test]
fn empty_screen() {
    let provider = ChatProvider::new(ManualEnv::new(), 7, ProviderConfig::default());

    insta::assert_snapshot!(screen(&provider), @r#"
    "┌ no room ─────────────────────┐"
    "│/room <id> to join a room     │"
    "└──────────────────────────────┘"
    "┌──────────────────────────────┐"
    "│>                             │"
    "└──────────────────────────────┘"
    " no room                        "
    "#);
}

#[test]
fn open_room_with_history() {
    let env = ManualEnv::new();
    let history = vec![ChatMessage {
        message_type: MessageType::Server,
        room: 42,
        sender_id: 3,
        message: "send it".to_string(),
        sent_at: env.wall_clock(),
        client_nonce: None,
    }];
    let mut provider = ChatProvider::new(env, 7, ProviderConfig::default());
    provider.handle(AppEvent::OpenRoom { room_id: 42, history });
    provider.handle(AppEvent::Opened);

    insta::assert_snapshot!(screen(&provider), @r#"
    "┌ room 42 ─────────────────────┐"
    "│09:30 <3> send it             │"
    "└──────────────────────────────┘"
    "┌──────────────────────────────┐"
    "│>                             │"
    "└──────────────────────────────┘"
    " open | room 42 | 1 messages    "
    "#);
}
