//! Client
//!
//! Action-based room session for Belay chat. Binds one room to a connection
//! manager, owns the room's message log, and reconciles optimistic sends with
//! their server echoes.
//!
//! # Architecture
//!
//! The session follows the same Sans-IO and action-based patterns as
//! [`belay_core`]. It receives events ([`SessionEvent`]), processes them
//! through pure state machine logic, and returns actions ([`SessionAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Session`]: Per-room state machine
//! - [`MessageLog`]: Ordered, append-only conversation with ticket states
//! - [`SessionEvent`]: Events fed into the session
//! - [`SessionAction`]: Actions produced by the session
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Socket`]: Channel pair bridged to a WebSocket task
//! - [`transport::connect`]: Open a WebSocket to a room

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod log;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use belay_core::{ConnectionConfig, ConnectionState, Environment};
pub use belay_proto::{ChatMessage, Frame, MessageType, RoomId, UserId};
pub use error::SessionError;
pub use event::{SessionAction, SessionEvent};
pub use log::{LogEntry, MessageLog, TicketState};
pub use session::{DEFAULT_ECHO_WINDOW, Session, SessionConfig};
