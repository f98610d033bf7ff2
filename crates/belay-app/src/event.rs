//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::ChatProvider`].
//!
//! Events originate from two distinct sources:
//! - User interactions (submitted lines, room navigation) and system ticks.
//! - Transport notifications reported by the driver.

use belay_proto::{ChatMessage, Frame, RoomId};

/// Events processed by the chat provider.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A line of user input: a message, or a `/command`.
    Submit(String),

    /// Mount a room view.
    OpenRoom {
        /// Room to mount.
        room_id: RoomId,
        /// Already-fetched history, oldest first.
        history: Vec<ChatMessage>,
    },

    /// Unmount the current room view.
    CloseRoom,

    /// Transport finished dialing.
    Opened,

    /// Transport dial failed.
    DialFailed {
        /// Failure description.
        reason: String,
    },

    /// Frame arrived on the transport.
    FrameReceived(Frame),

    /// Writing a frame failed and the transport was dropped.
    TransmitFailed {
        /// Frame that could not be written.
        frame: Frame,
        /// Failure description.
        reason: String,
    },

    /// Transport ended without being asked to.
    TransportClosed {
        /// Failure description.
        reason: String,
    },

    /// Periodic tick.
    Tick,

    /// Screen needs repainting (input edited, terminal resized).
    Redraw,

    /// Leave the application.
    Quit,
}
