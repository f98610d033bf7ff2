//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The room transport is a
//! WebSocket from [`belay_client::transport`].

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use belay_app::{AppEvent, ChatProvider, Driver, TransportEvent};
use belay_client::transport::{self, Socket, TransportError};
use belay_core::Environment;
use belay_proto::Frame;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::{InputState, KeyInput, ui};

/// Longest wait for input before the runtime gets to tick.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Send attempted with no socket open.
    #[error("no socket open")]
    NotConnected,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and the room
/// socket (tokio-tungstenite). Owns the input state for text editing.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    socket: Option<Socket>,
    /// Transport events read while waiting for input
    stash: VecDeque<belay_client::transport::TransportEvent>,
    input_state: InputState,
    /// Deadline for each dial's handshake
    connect_timeout: Duration,
}

impl TerminalDriver {
    /// Take over the terminal: raw mode and the alternate screen.
    ///
    /// Dials that have not completed their handshake within
    /// `connect_timeout` fail and go through the reconnect backoff.
    pub fn new(connect_timeout: Duration) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            socket: None,
            stash: VecDeque::new(),
            input_state: InputState::new(),
            connect_timeout,
        })
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

/// Next event from the socket, or never if none is open.
async fn next_inbound(
    socket: &mut Option<Socket>,
) -> Option<belay_client::transport::TransportEvent> {
    match socket {
        Some(socket) => socket.from_server.recv().await,
        None => std::future::pending().await,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        let Self { event_stream, socket, stash, input_state, .. } = self;

        tokio::select! {
            biased;

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        Ok(Self::convert_key(key_event.code).and_then(|key| input_state.handle_key(key)))
                    },
                    Some(Ok(Event::Resize(..))) => Ok(Some(AppEvent::Redraw)),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            Some(event) = next_inbound(socket) => {
                stash.push_back(event);
                Ok(None)
            }

            () = tokio::time::sleep(POLL_INTERVAL) => Ok(None),
        }
    }

    async fn dial(&mut self, url: &str) -> Result<(), Self::Error> {
        self.disconnect();
        self.socket = Some(transport::connect_with_timeout(url, self.connect_timeout).await?);
        Ok(())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let socket = self.socket.as_ref().ok_or(TerminalError::NotConnected)?;
        socket.send(frame).await?;
        Ok(())
    }

    fn recv_transport(&mut self) -> Option<TransportEvent> {
        let event = match self.stash.pop_front() {
            Some(event) => event,
            None => self.socket.as_mut()?.try_recv()?,
        };

        Some(match event {
            belay_client::transport::TransportEvent::Frame(frame) => TransportEvent::Frame(frame),
            belay_client::transport::TransportEvent::Closed { reason } => {
                self.socket = None;
                self.stash.clear();
                TransportEvent::Closed { reason }
            },
        })
    }

    fn disconnect(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
        self.stash.clear();
    }

    fn clear_input(&mut self) {
        self.input_state.clear();
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render<E: Environment>(&mut self, provider: &ChatProvider<E>) -> Result<(), Self::Error> {
        let input_state = &self.input_state;
        self.terminal.draw(|frame| ui::render(frame, provider, input_state))?;
        Ok(())
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.disconnect();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
