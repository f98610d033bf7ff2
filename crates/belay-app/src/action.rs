//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::ChatProvider`] for the runtime to execute.

use belay_proto::Frame;

/// Actions produced by the chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Open a transport to the mounted room.
    Dial {
        /// Transport target.
        url: String,
    },

    /// Write a frame to the open transport.
    Transmit(Frame),

    /// Drop the current transport without waiting.
    Disconnect,

    /// The submitted line was accepted; empty the input draft.
    ClearInput,
}
