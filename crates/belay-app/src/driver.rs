//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use belay_core::Environment;
use belay_proto::Frame;

use crate::{AppEvent, ChatProvider};

/// Event read from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame from the server.
    Frame(Frame),

    /// Transport ended (close frame, read or write error).
    Closed {
        /// What ended it.
        reason: String,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and in tests.
///
/// # Implementations
///
/// - **Terminal**: stdin lines for input, tokio-tungstenite for transport
/// - **Tests**: scripted input and an in-memory echo server
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in tests.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next input event.
    ///
    /// Returns available events or `None` if no events are ready.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Open a transport to `url`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be established. The runtime
    /// reports this to the provider as a failed dial; it is not fatal.
    fn dial(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a frame over the open transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport is open or the write fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Next transport event without waiting. `None` if nothing is ready or
    /// no transport is open.
    fn recv_transport(&mut self) -> Option<TransportEvent>;

    /// Drop the current transport. No-op if none is open.
    fn disconnect(&mut self);

    /// Empty the input draft after its line was accepted. Rejected lines
    /// stay in the draft for editing.
    fn clear_input(&mut self);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the provider state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render<E: Environment>(&mut self, provider: &ChatProvider<E>) -> Result<(), Self::Error>;
}
