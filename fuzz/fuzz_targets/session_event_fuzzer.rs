//! Fuzz target for the room session
//!
//! # Strategy
//!
//! - Sends of arbitrary text, including blank and oversized lines
//! - Inbound frames that are echoes of our own sends, other senders, other
//!   rooms, or raw garbage
//! - Failed writes of our own sends
//! - Transport churn and virtual time so reconnects interleave with sends
//!
//! # Invariants
//!
//! - The log never shrinks and never reorders existing entries
//! - Every entry belongs to the session's room
//! - Pending tickets never outnumber log entries
//! - After close, nothing changes

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use belay_client::{ChatMessage, MessageType, Session, SessionConfig, SessionEvent};
use belay_core::{env::test_utils::ManualEnv, Environment};
use belay_proto::Frame;
use libfuzzer_sys::fuzz_target;

const ROOM: u64 = 42;
const ME: u64 = 7;

#[derive(Debug, Clone, Arbitrary)]
enum SessionOp {
    Send(String),
    EchoLast { with_nonce: bool },
    Inbound { other_room: bool, sender: u8, text: String },
    Garbage(String),
    WriteFailedLast,
    Opened,
    DialFailed,
    TransportClosed,
    Advance { millis: u16 },
    Close,
}

fuzz_target!(|ops: Vec<SessionOp>| {
    let env = ManualEnv::new();
    let Ok((mut session, _)) =
        Session::open(env.clone(), ROOM, ME, Vec::new(), SessionConfig::default())
    else {
        return;
    };

    for op in ops {
        let before: Vec<ChatMessage> = session.log().iter().map(|e| e.message().clone()).collect();
        let was_closed = session.is_closed();

        let event = match op {
            SessionOp::Send(text) => SessionEvent::Send { text },
            SessionOp::EchoLast { with_nonce } => {
                let Some(entry) = session.log().iter().rev().find(|e| e.message().is_from(ME))
                else {
                    continue;
                };
                let mut echo = entry.message().clone();
                echo.message_type = MessageType::Server;
                if !with_nonce {
                    echo.client_nonce = None;
                }
                SessionEvent::FrameReceived(belay_proto::encode(&echo))
            },
            SessionOp::Inbound { other_room, sender, text } => {
                let message = ChatMessage {
                    message_type: MessageType::Server,
                    room: if other_room { ROOM + 1 } else { ROOM },
                    sender_id: u64::from(sender),
                    message: text,
                    sent_at: env.wall_clock(),
                    client_nonce: None,
                };
                SessionEvent::FrameReceived(belay_proto::encode(&message))
            },
            SessionOp::Garbage(text) => SessionEvent::FrameReceived(Frame::new(text)),
            SessionOp::WriteFailedLast => {
                let Some(entry) = session.log().iter().rev().find(|e| e.message().is_from(ME))
                else {
                    continue;
                };
                SessionEvent::TransmitFailed {
                    frame: belay_proto::encode(entry.message()),
                    reason: "socket closed".to_string(),
                }
            },
            SessionOp::Opened => SessionEvent::Opened,
            SessionOp::DialFailed => SessionEvent::DialFailed { reason: "refused".to_string() },
            SessionOp::TransportClosed => {
                SessionEvent::TransportClosed { reason: "reset".to_string() }
            },
            SessionOp::Advance { millis } => {
                env.advance(Duration::from_millis(u64::from(millis)));
                SessionEvent::Tick { now: env.now() }
            },
            SessionOp::Close => SessionEvent::Close,
        };

        let _ = session.handle(event);

        let after: Vec<ChatMessage> = session.log().iter().map(|e| e.message().clone()).collect();
        assert!(after.len() >= before.len(), "log shrank");
        assert_eq!(&after[..before.len()], &before[..], "existing entries changed");
        assert!(after.iter().all(|m| m.room == ROOM), "foreign room in log");
        assert!(session.pending_tickets() <= after.len());

        if was_closed {
            assert_eq!(after.len(), before.len(), "log grew after close");
        }
    }
});
