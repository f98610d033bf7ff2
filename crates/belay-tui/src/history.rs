//! Room history loaded from disk.
//!
//! History is fetched by whatever owns the REST side of the app and handed
//! over as a JSON array of messages, oldest first, in the same envelope the
//! socket carries.

use std::{fs, io, path::Path};

use belay_proto::{ChatMessage, RoomId};
use thiserror::Error;

/// History file errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// File could not be read.
    #[error("cannot read history: {0}")]
    Io(#[from] io::Error),

    /// File is not a JSON array of messages.
    #[error("malformed history: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse history for `room_id`. Messages for other rooms are dropped.
pub fn parse(text: &str, room_id: RoomId) -> Result<Vec<ChatMessage>, HistoryError> {
    let messages: Vec<ChatMessage> = serde_json::from_str(text)?;
    let total = messages.len();

    let history: Vec<_> = messages.into_iter().filter(|m| m.room == room_id).collect();
    if history.len() < total {
        tracing::warn!(room_id, dropped = total - history.len(), "history held other rooms");
    }

    Ok(history)
}

/// Read and parse a history file.
pub fn load(path: &Path, room_id: RoomId) -> Result<Vec<ChatMessage>, HistoryError> {
    let text = fs::read_to_string(path)?;
    parse(&text, room_id)
}
