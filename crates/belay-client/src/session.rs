//! Room session state machine.
//!
//! A `Session` binds one room to one [`Connection`]. It is the only component
//! that mutates the room's [`MessageLog`]: outgoing messages are appended
//! optimistically with a `Pending` ticket, and the server echo confirms the
//! ticket in place instead of appending a duplicate.
//!
//! # Echo matching
//!
//! An inbound message confirms a pending ticket when:
//! 1. it carries a `client_nonce` equal to the ticket's nonce, or
//! 2. it carries no nonce, comes from this session's sender, has identical
//!    text, and arrives within the echo window of the ticket. The oldest
//!    such ticket wins.
//!
//! Failed tickets never match.

use std::{collections::HashSet, time::Duration};

use belay_core::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionError, ConnectionState, Environment,
};
use belay_proto::{ChatMessage, Frame, MAX_MESSAGE_CHARS, MessageType, RoomId, UserId};

use crate::{
    error::SessionError,
    event::{SessionAction, SessionEvent},
    log::{MessageLog, TicketState},
};

/// Default window within which a nonce-less echo may confirm a ticket.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_secs(30);

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Connection manager settings
    pub connection: ConnectionConfig,
    /// Window for content-based echo matching
    pub echo_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { connection: ConnectionConfig::default(), echo_window: DEFAULT_ECHO_WINDOW }
    }
}

/// In-flight outgoing message awaiting its echo.
#[derive(Debug, Clone)]
struct SendTicket<I> {
    /// Index of the optimistic entry in the log
    position: usize,
    /// Correlation id sent on the wire
    nonce: String,
    /// Trimmed text as sent
    text: String,
    /// When the message was handed to the transport
    created_at: I,
}

/// Chat session for a single room.
pub struct Session<E: Environment> {
    /// Environment for time and randomness
    env: E,
    /// Room this session is bound to
    room_id: RoomId,
    /// Authenticated sender
    sender_id: UserId,
    /// Echo matching window
    echo_window: Duration,
    /// Connection manager, exclusively owned
    connection: Connection<E::Instant>,
    /// Conversation, exclusively owned
    log: MessageLog,
    /// Pending tickets, oldest first
    tickets: Vec<SendTicket<E::Instant>>,
    /// Nonces already confirmed; repeated echoes are dropped
    confirmed: HashSet<String>,
    /// Set by `close()`
    closed: bool,
}

impl<E: Environment> Session<E> {
    /// Open a session for `room_id`, seeded with `history`, and start
    /// connecting.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidRoom` for room 0
    pub fn open(
        env: E,
        room_id: RoomId,
        sender_id: UserId,
        history: Vec<ChatMessage>,
        config: SessionConfig,
    ) -> Result<(Self, Vec<SessionAction>), SessionError> {
        if room_id == 0 {
            return Err(SessionError::InvalidRoom { room_id });
        }

        let mut connection = Connection::new(room_id, config.connection);
        let connect_actions = connection.connect()?;

        tracing::info!(room_id, sender_id, history = history.len(), "session opened");

        let session = Self {
            env,
            room_id,
            sender_id,
            echo_window: config.echo_window,
            connection,
            log: MessageLog::with_history(history),
            tickets: Vec::new(),
            confirmed: HashSet::new(),
            closed: false,
        };

        let mut actions = vec![SessionAction::LogChanged];
        session.convert_connection_actions(connect_actions, &mut actions);
        Ok((session, actions))
    }

    /// Room this session is bound to.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sender id stamped on outgoing messages.
    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    /// Read-only view of the conversation.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// True once `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of tickets still waiting for their echo.
    pub fn pending_tickets(&self) -> usize {
        self.tickets.len()
    }

    /// Time left until the next reconnect dial, if one is scheduled.
    pub fn retry_due_in(&self) -> Option<Duration> {
        self.connection.retry_due_in(self.env.now())
    }

    /// Register an observer for raw inbound frames, delivered while the
    /// connection is open and before the session decodes them.
    pub fn on_message(&mut self, handler: impl FnMut(&Frame) + Send + 'static) {
        self.connection.on_message(handler);
    }

    /// Register an observer for connection state transitions.
    pub fn on_state_change(&mut self, handler: impl FnMut(&ConnectionState) + Send + 'static) {
        self.connection.on_state_change(handler);
    }

    /// Process an event and return resulting actions.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Send { text } => self.handle_send(&text),
            SessionEvent::FrameReceived(frame) => Ok(self.handle_frame(&frame)),
            SessionEvent::Opened => self.handle_opened(),
            SessionEvent::DialFailed { reason } => self.handle_dial_failed(&reason),
            SessionEvent::TransmitFailed { frame, reason } => {
                Ok(self.handle_transmit_failed(&frame, &reason))
            },
            SessionEvent::TransportClosed { reason } => Ok(self.handle_transport_closed(&reason)),
            SessionEvent::Tick { now } => Ok(self.handle_tick(now)),
            SessionEvent::Close => Ok(self.close()),
        }
    }

    /// Close the session. Idempotent.
    ///
    /// Closes the connection (cancelling any pending retry) and freezes the
    /// log. Tickets keep their last state.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        if self.closed {
            return actions;
        }

        self.closed = true;
        self.log.freeze();

        let connection_actions = self.connection.close();
        self.convert_connection_actions(connection_actions, &mut actions);

        tracing::info!(
            room_id = self.room_id,
            pending = self.tickets.len(),
            "session closed"
        );
        actions
    }

    fn handle_send(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let chars = trimmed.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(SessionError::TooLong { chars });
        }

        let nonce = self.env.nonce();
        let message = ChatMessage {
            message_type: MessageType::Client,
            room: self.room_id,
            sender_id: self.sender_id,
            message: trimmed.to_string(),
            sent_at: self.env.wall_clock(),
            client_nonce: Some(nonce.clone()),
        };
        let frame = belay_proto::encode(&message);

        let position = self.log.append(message, Some(TicketState::Pending))?;
        let mut actions = Vec::new();

        match self.connection.send(frame) {
            Ok(action) => {
                self.tickets.push(SendTicket {
                    position,
                    nonce,
                    text: trimmed.to_string(),
                    created_at: self.env.now(),
                });
                self.convert_connection_actions(vec![action], &mut actions);
            },
            Err(ConnectionError::NotOpen { state }) => {
                tracing::warn!(room_id = self.room_id, ?state, "send while not open, marked failed");
                self.log.set_ticket(position, TicketState::Failed)?;
            },
            Err(e) => return Err(e.into()),
        }

        actions.push(SessionAction::LogChanged);
        Ok(actions)
    }

    fn handle_frame(&mut self, frame: &Frame) -> Vec<SessionAction> {
        if self.closed {
            tracing::debug!(room_id = self.room_id, "frame after close ignored");
            return vec![];
        }

        if !self.connection.handle_frame(frame) {
            return vec![];
        }

        let message = match belay_proto::decode(frame) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(room_id = self.room_id, %error, "dropping undecodable frame");
                return vec![];
            },
        };

        if message.room != self.room_id {
            tracing::warn!(
                room_id = self.room_id,
                frame_room = message.room,
                "dropping frame for another room"
            );
            return vec![];
        }

        if let Some(nonce) = message.client_nonce.as_deref()
            && self.confirmed.contains(nonce)
        {
            tracing::debug!(room_id = self.room_id, nonce, "duplicate echo ignored");
            return vec![];
        }

        if let Some(index) = self.match_ticket(&message) {
            let ticket = self.tickets.remove(index);
            if let Err(error) = self.log.set_ticket(ticket.position, TicketState::Confirmed) {
                tracing::warn!(room_id = self.room_id, %error, "could not confirm ticket");
                return vec![];
            }
            tracing::debug!(room_id = self.room_id, position = ticket.position, "ticket confirmed");
            self.confirmed.insert(ticket.nonce);
            return vec![SessionAction::LogChanged];
        }

        match self.log.append(message, None) {
            Ok(_) => vec![SessionAction::LogChanged],
            Err(error) => {
                tracing::warn!(room_id = self.room_id, %error, "could not append message");
                vec![]
            },
        }
    }

    /// Index into `tickets` of the ticket confirmed by `message`, if any.
    fn match_ticket(&self, message: &ChatMessage) -> Option<usize> {
        if let Some(nonce) = message.client_nonce.as_deref() {
            return self.tickets.iter().position(|ticket| ticket.nonce == nonce);
        }

        if !message.is_from(self.sender_id) {
            return None;
        }

        let now = self.env.now();
        self.tickets.iter().position(|ticket| {
            ticket.text == message.message && now - ticket.created_at <= self.echo_window
        })
    }

    fn handle_opened(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let connection_actions = self.connection.handle_opened()?;
        let mut actions = Vec::new();
        self.convert_connection_actions(connection_actions, &mut actions);
        Ok(actions)
    }

    fn handle_dial_failed(&mut self, reason: &str) -> Result<Vec<SessionAction>, SessionError> {
        if self.closed {
            return Ok(vec![]);
        }
        let connection_actions = self.connection.handle_dial_failed(self.env.now(), reason)?;
        let mut actions = Vec::new();
        self.convert_connection_actions(connection_actions, &mut actions);
        Ok(actions)
    }

    fn handle_transport_closed(&mut self, reason: &str) -> Vec<SessionAction> {
        if self.closed {
            return vec![];
        }
        let connection_actions = self.connection.handle_transport_closed(self.env.now(), reason);
        let mut actions = Vec::new();
        self.convert_connection_actions(connection_actions, &mut actions);
        actions
    }

    /// Mark the ticket carried by `frame` failed, then treat the transport
    /// as closed.
    fn handle_transmit_failed(&mut self, frame: &Frame, reason: &str) -> Vec<SessionAction> {
        if self.closed {
            return vec![];
        }

        let nonce = belay_proto::decode(frame).ok().and_then(|message| message.client_nonce);
        let index = nonce
            .as_deref()
            .and_then(|nonce| self.tickets.iter().position(|ticket| ticket.nonce == nonce));

        let mut actions = Vec::new();
        if let Some(index) = index {
            let ticket = self.tickets.remove(index);
            match self.log.set_ticket(ticket.position, TicketState::Failed) {
                Ok(()) => {
                    tracing::warn!(
                        room_id = self.room_id,
                        position = ticket.position,
                        reason,
                        "transmit failed, marked failed"
                    );
                    actions.push(SessionAction::LogChanged);
                },
                Err(error) => {
                    tracing::warn!(room_id = self.room_id, %error, "could not fail ticket");
                },
            }
        } else {
            tracing::debug!(room_id = self.room_id, reason, "transmit failed for untracked frame");
        }

        actions.extend(self.handle_transport_closed(reason));
        actions
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<SessionAction> {
        if self.closed {
            return vec![];
        }
        let connection_actions = self.connection.tick(now);
        let mut actions = Vec::new();
        self.convert_connection_actions(connection_actions, &mut actions);
        actions
    }

    /// Convert connection actions to session actions.
    fn convert_connection_actions(
        &self,
        connection_actions: Vec<ConnectionAction>,
        actions: &mut Vec<SessionAction>,
    ) {
        for action in connection_actions {
            match action {
                ConnectionAction::Dial { url, attempt } => {
                    tracing::debug!(room_id = self.room_id, attempt, "dial requested");
                    actions.push(SessionAction::Dial { url });
                },
                ConnectionAction::Transmit(frame) => actions.push(SessionAction::Transmit(frame)),
                ConnectionAction::Disconnect => actions.push(SessionAction::Disconnect),
                ConnectionAction::StateChanged(state) => {
                    actions.push(SessionAction::ConnectionChanged(state));
                },
                ConnectionAction::RetryScheduled { attempt, delay } => {
                    actions.push(SessionAction::ReconnectScheduled { attempt, delay });
                },
                ConnectionAction::Lost(error) => actions.push(SessionAction::ConnectionLost(error)),
            }
        }
    }
}

impl<E: Environment> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("room_id", &self.room_id)
            .field("sender_id", &self.sender_id)
            .field("state", &self.connection.state())
            .field("entries", &self.log.len())
            .field("pending", &self.tickets.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
