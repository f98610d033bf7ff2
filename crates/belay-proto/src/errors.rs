//! Error types for frame decoding.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Reasons an inbound frame cannot be turned into a [`crate::ChatMessage`].
///
/// Both variants are non-fatal: the caller drops the frame, logs, and keeps
/// the session running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is not valid JSON, not an object, or a required field is missing
    /// or has the wrong type.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// `messageType` is outside the known set (likely a newer protocol).
    #[error("unknown message type: {0:?}")]
    UnknownType(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
