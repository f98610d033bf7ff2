//! Text frames and the envelope codec.
//!
//! A [`Frame`] is the unit the transport moves: one UTF-8 text message holding
//! a JSON envelope. The codec is pure; it never logs and never invents
//! messages. Callers decide what to do with a rejected frame.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    ChatMessage, MessageType, RoomId, UserId,
    errors::{DecodeError, Result},
};

/// One serialized transport unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Wrap already-serialized text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Frame contents.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the frame, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Size of the frame in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if the frame carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self { text: text.to_owned() }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Inbound shape. `message_type` stays a string so an unknown type can be
/// told apart from a structurally broken frame.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    message_type: String,
    room: RoomId,
    sender_id: UserId,
    message: String,
    sent_at: DateTime<Utc>,
    #[serde(default)]
    client_nonce: Option<String>,
}

/// Encode a message into a frame.
///
/// Total for every well-formed [`ChatMessage`]: all fields are plain data and
/// serialize to JSON without failure.
pub fn encode(message: &ChatMessage) -> Frame {
    // INVARIANT: ChatMessage has string keys and no maps or non-finite
    // floats, so serde_json cannot fail here.
    let text = serde_json::to_string(message).unwrap_or_default();
    debug_assert!(!text.is_empty());
    Frame { text }
}

/// Decode a frame into a message.
///
/// # Errors
///
/// - [`DecodeError::Malformed`] if the text is not a JSON object with the
///   required fields
/// - [`DecodeError::UnknownType`] if `messageType` is not one of `CLIENT`,
///   `SERVER`, `SYSTEM`
pub fn decode(frame: &Frame) -> Result<ChatMessage> {
    let wire: WireEnvelope = serde_json::from_str(&frame.text)?;

    let Some(message_type) = MessageType::from_wire(&wire.message_type) else {
        return Err(DecodeError::UnknownType(wire.message_type));
    };

    Ok(ChatMessage {
        message_type,
        room: wire.room,
        sender_id: wire.sender_id,
        message: wire.message,
        sent_at: wire.sent_at,
        client_nonce: wire.client_nonce,
    })
}
