//! Session errors.

use belay_core::ConnectionError;
use belay_proto::{MAX_MESSAGE_CHARS, RoomId};
use thiserror::Error;

/// Errors returned by [`crate::Session`] operations.
///
/// Validation errors (`EmptyMessage`, `TooLong`) are raised before anything is
/// appended to the log or handed to the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Message was empty after trimming
    #[error("message is empty")]
    EmptyMessage,

    /// Message exceeds the character limit after trimming
    #[error("message is {chars} characters, limit is {MAX_MESSAGE_CHARS}")]
    TooLong {
        /// Character count of the trimmed message
        chars: usize,
    },

    /// Session was closed; no further sends are accepted
    #[error("session is closed")]
    Closed,

    /// Room ids start at 1
    #[error("invalid room id {room_id}")]
    InvalidRoom {
        /// Rejected room id
        room_id: RoomId,
    },

    /// No room is mounted
    #[error("no room mounted")]
    NotMounted,

    /// Connection manager rejected the operation
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl SessionError {
    /// Returns true if the error came from user input rather than session
    /// state. The UI shows these inline and keeps the draft.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyMessage | Self::TooLong { .. })
    }
}
