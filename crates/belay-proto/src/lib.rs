//! Belay wire protocol
//!
//! Message envelope and codec for per-room chat over a text transport.
//!
//! # Components
//!
//! - [`ChatMessage`]: The envelope exchanged with the server
//! - [`Frame`]: One serialized transport unit (a WebSocket text message)
//! - [`encode`] / [`decode`]: Total encoder and fallible decoder
//! - [`DecodeError`]: Why an inbound frame was rejected
//!
//! # Wire format
//!
//! ```text
//! { "messageType": "CLIENT" | "SERVER" | "SYSTEM",
//!   "room": <integer>,
//!   "senderId": <integer>,
//!   "message": <string>,
//!   "sentAt": <ISO-8601 timestamp>,
//!   "clientNonce": <string, optional> }
//! ```
//!
//! Unknown fields are ignored so older clients keep working against newer
//! servers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod message;

pub use errors::DecodeError;
pub use frame::{Frame, decode, encode};
pub use message::{ChatMessage, MAX_MESSAGE_CHARS, MessageType, RoomId, UserId};
