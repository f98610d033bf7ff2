//! Fuzz target for the connection state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of transport outcomes, ticks, sends, and closes
//! - Small attempt budgets so exhaustion is reached often
//!
//! # Invariants
//!
//! - Closed is terminal: no action is ever emitted after it
//! - `attempts` never exceeds the configured budget
//! - Transmit only succeeds while Open
//! - Every scheduled delay is within the backoff cap

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use belay_core::{
    BackoffPolicy, Connection, ConnectionAction, ConnectionConfig, ConnectionState,
};
use belay_proto::Frame;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum ConnectionOp {
    Connect,
    Opened,
    DialFailed,
    TransportClosed,
    Advance { millis: u16 },
    Send,
    Frame,
    Close,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_attempts: u8,
    ops: Vec<ConnectionOp>,
}

fuzz_target!(|input: Input| {
    let max_attempts = u32::from(input.max_attempts % 8);
    let backoff = BackoffPolicy { base: Duration::from_millis(10), max: Duration::from_millis(80) };
    let config = ConnectionConfig { endpoint: "ws://fuzz".to_string(), backoff, max_attempts };

    let start = Instant::now();
    let mut now = start;
    let mut connection: Connection<Instant> = Connection::new(9, config);

    for op in input.ops {
        let was_closed = connection.state() == ConnectionState::Closed;

        let actions = match op {
            ConnectionOp::Connect => connection.connect().unwrap_or_default(),
            ConnectionOp::Opened => connection.handle_opened().unwrap_or_default(),
            ConnectionOp::DialFailed => {
                connection.handle_dial_failed(now, "refused").unwrap_or_default()
            },
            ConnectionOp::TransportClosed => connection.handle_transport_closed(now, "reset"),
            ConnectionOp::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
                connection.tick(now)
            },
            ConnectionOp::Send => {
                let open = connection.state() == ConnectionState::Open;
                let sent = connection.send(Frame::new("{}"));
                assert_eq!(sent.is_ok(), open);
                Vec::new()
            },
            ConnectionOp::Frame => {
                let open = connection.state() == ConnectionState::Open;
                assert_eq!(connection.handle_frame(&Frame::new("{}")), open);
                Vec::new()
            },
            ConnectionOp::Close => connection.close(),
        };

        if was_closed {
            assert!(
                actions.iter().all(|a| matches!(a, ConnectionAction::Disconnect)),
                "closed connection emitted {actions:?}"
            );
            assert_eq!(connection.state(), ConnectionState::Closed);
        }

        assert!(connection.attempts() <= max_attempts);

        for action in &actions {
            if let ConnectionAction::RetryScheduled { delay, .. } = action {
                assert!(*delay <= backoff.max);
            }
        }
    }
});
