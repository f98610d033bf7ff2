//! Session events and actions.

use std::time::Duration;

use belay_core::{ConnectionError, ConnectionState};
use belay_proto::Frame;

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Reporting transport outcomes (opened, dial failed, closed)
/// - Receiving frames from the network
/// - Driving time forward via ticks
/// - Forwarding user intents (send, close)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and virtual time in tests.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// User submitted text for this room.
    Send {
        /// Raw text; trimmed before validation.
        text: String,
    },

    /// Frame received from the server.
    FrameReceived(Frame),

    /// Transport finished dialing and is open.
    Opened,

    /// Transport dial failed.
    DialFailed {
        /// Transport failure description
        reason: String,
    },

    /// Writing a `Transmit` frame failed. The transport is gone.
    TransmitFailed {
        /// Frame that could not be written
        frame: Frame,
        /// Transport failure description
        reason: String,
    },

    /// Transport closed without being asked to.
    TransportClosed {
        /// Transport failure description
        reason: String,
    },

    /// Time tick for reconnect deadlines.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// Caller is done with this room.
    Close,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a transport to `url`, then feed back `Opened` or `DialFailed`.
    Dial {
        /// Transport target
        url: String,
    },

    /// Write a frame to the open transport.
    Transmit(Frame),

    /// Release the transport.
    Disconnect,

    /// The message log changed (entry appended or ticket state moved).
    LogChanged,

    /// Connection state moved.
    ConnectionChanged(ConnectionState),

    /// A reconnect is scheduled.
    ReconnectScheduled {
        /// Retry number (1-based)
        attempt: u32,
        /// Wait before dialing
        delay: Duration,
    },

    /// Retry budget exhausted; the room stays readable but can no longer
    /// send.
    ConnectionLost(ConnectionError),
}
