//! Chat message envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Positive integer identifying a chat room.
pub type RoomId = u64;

/// Stable identifier of a participant.
pub type UserId = u64;

/// Maximum message length in characters (Unicode scalar values), after
/// trimming. Enforced by the sending client; the server is authoritative.
pub const MAX_MESSAGE_CHARS: usize = 300;

/// Origin of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Authored locally by this client.
    Client,
    /// Relayed by the server from another participant.
    Server,
    /// Session or system notice.
    System,
}

impl MessageType {
    /// Every known message type, in wire order.
    pub const ALL: [Self; 3] = [Self::Client, Self::Server, Self::System];

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Server => "SERVER",
            Self::System => "SYSTEM",
        }
    }

    /// Parse the wire representation. `None` for anything outside the set.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == value)
    }
}

/// A single chat message as exchanged with the server.
///
/// # Invariants
///
/// - `room` is positive.
/// - `message` is non-empty after trimming and at most [`MAX_MESSAGE_CHARS`]
///   characters when produced by this client. Inbound messages are not
///   re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Who produced the message.
    pub message_type: MessageType,
    /// Room the message belongs to.
    pub room: RoomId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Message text.
    pub message: String,
    /// Wall-clock time the message was sent.
    pub sent_at: DateTime<Utc>,
    /// Client-generated correlation id, echoed back by the server so the
    /// sender can reconcile its optimistic copy. `None` on messages from
    /// servers that do not echo it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_nonce: Option<String>,
}

impl ChatMessage {
    /// Message length in characters.
    pub fn char_count(&self) -> usize {
        self.message.chars().count()
    }

    /// True if this message was authored by `sender_id`.
    pub fn is_from(&self, sender_id: UserId) -> bool {
        self.sender_id == sender_id
    }
}
