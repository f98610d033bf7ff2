//! Property tests for the connection state machine.
//!
//! These tests verify critical invariants over arbitrary event sequences:
//! - `Closed` is terminal
//! - Frames are only transmitted while open
//! - Reconnect attempts never exceed the configured budget
//! - Every scheduled delay respects the backoff ceiling

use std::time::Duration;

use belay_core::{
    BackoffPolicy, Connection, ConnectionAction, ConnectionConfig, ConnectionState,
    env::test_utils::VirtualInstant,
};
use belay_proto::Frame;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Event {
    Connect,
    Opened,
    DialFailed,
    TransportClosed,
    Advance(u64),
    Send,
    Close,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => Just(Event::Connect),
        3 => Just(Event::Opened),
        3 => Just(Event::DialFailed),
        2 => Just(Event::TransportClosed),
        4 => (0u64..2_000).prop_map(Event::Advance),
        2 => Just(Event::Send),
        1 => Just(Event::Close),
    ]
}

fn config(max_attempts: u32) -> ConnectionConfig {
    ConnectionConfig {
        endpoint: "ws://chat.test/ws".to_string(),
        backoff: BackoffPolicy { base: Duration::from_millis(50), max: Duration::from_millis(800) },
        max_attempts,
    }
}

proptest! {
    /// INVARIANT: No sequence of events panics, and the observable state
    /// obeys the lifecycle rules after every step.
    #[test]
    fn lifecycle_invariants_hold(
        max_attempts in 0u32..6,
        events in prop::collection::vec(event_strategy(), 0..64),
    ) {
        let mut conn: Connection<VirtualInstant> = Connection::new(42, config(max_attempts));
        let mut now = VirtualInstant::default();
        let mut closed = false;

        for event in events {
            let before = conn.state();
            let actions = match event {
                Event::Connect => conn.connect().unwrap_or_default(),
                Event::Opened => conn.handle_opened().unwrap_or_default(),
                Event::DialFailed => conn.handle_dial_failed(now, "refused").unwrap_or_default(),
                Event::TransportClosed => conn.handle_transport_closed(now, "reset"),
                Event::Advance(ms) => {
                    now = now + Duration::from_millis(ms);
                    conn.tick(now)
                },
                Event::Send => match conn.send(Frame::from("{}")) {
                    Ok(action) => {
                        prop_assert_eq!(before, ConnectionState::Open);
                        vec![action]
                    },
                    Err(_) => {
                        prop_assert_ne!(before, ConnectionState::Open);
                        vec![]
                    },
                },
                Event::Close => conn.close(),
            };

            // Closed is terminal
            if closed {
                prop_assert_eq!(conn.state(), ConnectionState::Closed);
                prop_assert!(actions.iter().all(|a| matches!(a, ConnectionAction::Disconnect)));
            }
            closed = conn.state() == ConnectionState::Closed;

            prop_assert!(conn.attempts() <= max_attempts);

            for action in &actions {
                match action {
                    ConnectionAction::Transmit(_) => {
                        prop_assert_eq!(conn.state(), ConnectionState::Open);
                    },
                    ConnectionAction::RetryScheduled { attempt, delay } => {
                        prop_assert!(*attempt >= 1 && *attempt <= max_attempts);
                        prop_assert!(*delay <= Duration::from_millis(800));
                        prop_assert_eq!(conn.state(), ConnectionState::Reconnecting);
                    },
                    ConnectionAction::Dial { url, .. } => {
                        prop_assert_eq!(url.as_str(), "ws://chat.test/ws/42");
                        prop_assert_eq!(conn.state(), ConnectionState::Connecting);
                    },
                    ConnectionAction::Lost(_) => {
                        prop_assert_eq!(conn.state(), ConnectionState::Closed);
                    },
                    ConnectionAction::Disconnect | ConnectionAction::StateChanged(_) => {},
                }
            }
        }
    }

    /// INVARIANT: A retry never dials before its delay elapses.
    #[test]
    fn retry_waits_full_delay(wait_ms in 0u64..1_000) {
        let mut conn: Connection<VirtualInstant> = Connection::new(7, config(3));
        let start = VirtualInstant::default();

        conn.connect().unwrap();
        conn.handle_dial_failed(start, "refused").unwrap();

        let actions = conn.tick(start + Duration::from_millis(wait_ms));
        let dialed = actions.iter().any(|a| matches!(a, ConnectionAction::Dial { .. }));

        prop_assert_eq!(dialed, wait_ms >= 50);
    }
}
