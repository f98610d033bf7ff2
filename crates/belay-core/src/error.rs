//! Error types for the connection manager.
//!
//! Transport-level failures (`ConnectFailed`, `ConnectionLost`) are reported
//! once the retry budget is exhausted. `NotOpen` is the local refusal to send
//! while no live socket exists.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Send attempted while the socket is not open
    #[error("connection not open (state {state:?})")]
    NotOpen {
        /// State at the time of the send
        state: ConnectionState,
    },

    /// Never reached the open state within the retry budget
    #[error("connect failed after {attempts} attempts: {reason}")]
    ConnectFailed {
        /// Dial attempts made
        attempts: u32,
        /// Last transport failure
        reason: String,
    },

    /// Was open, then lost the socket and could not reconnect
    #[error("connection lost after {attempts} reconnect attempts: {reason}")]
    ConnectionLost {
        /// Reconnect attempts made since the last open
        attempts: u32,
        /// Last transport failure
        reason: String,
    },
}
