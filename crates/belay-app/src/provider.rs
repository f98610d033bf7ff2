//! Chat provider.
//!
//! The [`ChatProvider`] scopes one room [`Session`] to a mounted room view.
//! It owns at most one session at a time: mounting a different room closes
//! the previous session (its `Disconnect` is issued first) before the new
//! one is opened, so two sockets never coexist and messages cannot bleed
//! between rooms.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//! Errors become status messages, never panics.

use belay_client::{
    ChatMessage, ConnectionState, MessageLog, Session, SessionAction, SessionConfig,
    SessionError, SessionEvent,
};
use belay_core::Environment;
use belay_proto::{RoomId, UserId};

use crate::{
    AppAction, AppEvent,
    input::{Command, HELP},
};

/// Provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Settings for every session the provider opens
    pub session: SessionConfig,
}

/// Owns the session of the mounted room.
pub struct ChatProvider<E: Environment> {
    /// Environment handed to each session
    env: E,
    /// Authenticated sender bound to `send`
    sender_id: UserId,
    /// Session settings
    config: ProviderConfig,
    /// Session of the mounted room. `None` if nothing is mounted.
    session: Option<Session<E>>,
    /// Persistent connection notice. `None` while healthy.
    banner: Option<String>,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl<E: Environment> ChatProvider<E> {
    /// Create a provider for an authenticated sender. Nothing is mounted.
    pub fn new(env: E, sender_id: UserId, config: ProviderConfig) -> Self {
        Self { env, sender_id, config, session: None, banner: None, status_message: None }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Submit(line) => self.handle_line(&line),
            AppEvent::OpenRoom { room_id, history } => self.mount_or_report(room_id, history),
            AppEvent::CloseRoom => self.unmount(),
            AppEvent::Opened => self.forward(SessionEvent::Opened),
            AppEvent::DialFailed { reason } => self.forward(SessionEvent::DialFailed { reason }),
            AppEvent::FrameReceived(frame) => self.forward(SessionEvent::FrameReceived(frame)),
            AppEvent::TransmitFailed { frame, reason } => {
                self.forward(SessionEvent::TransmitFailed { frame, reason })
            },
            AppEvent::TransportClosed { reason } => {
                self.forward(SessionEvent::TransportClosed { reason })
            },
            AppEvent::Tick => self.tick(self.env.now()),
            AppEvent::Redraw => vec![AppAction::Render],
            AppEvent::Quit => {
                let mut actions = self.unmount();
                actions.push(AppAction::Quit);
                actions
            },
        }
    }

    /// Mount a room view.
    ///
    /// Same room already mounted: no-op. Otherwise the previous session is
    /// closed before the new one opens.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidRoom` for room 0; the current room stays
    ///   mounted
    pub fn mount(
        &mut self,
        room_id: RoomId,
        history: Vec<ChatMessage>,
    ) -> Result<Vec<AppAction>, SessionError> {
        if room_id == 0 {
            return Err(SessionError::InvalidRoom { room_id });
        }

        if let Some(session) = &self.session
            && session.room_id() == room_id
        {
            return Ok(vec![]);
        }

        let mut actions = self.close_session();

        let (session, session_actions) = Session::open(
            self.env.clone(),
            room_id,
            self.sender_id,
            history,
            self.config.session.clone(),
        )?;
        self.session = Some(session);
        self.banner = Some(format!("connecting to room {room_id}"));
        self.status_message = None;

        tracing::info!(room_id, "room mounted");

        self.convert_session_actions(session_actions, &mut actions);
        push_render(&mut actions);
        Ok(actions)
    }

    /// Unmount the current room. Closes without waiting for the transport.
    pub fn unmount(&mut self) -> Vec<AppAction> {
        let mut actions = self.close_session();
        self.banner = None;
        push_render(&mut actions);
        actions
    }

    /// Send text to the mounted room.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotMounted` if no room is mounted
    /// - Validation errors from the session (`EmptyMessage`, `TooLong`)
    pub fn send(&mut self, text: &str) -> Result<Vec<AppAction>, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotMounted)?;
        let session_actions = session.handle(SessionEvent::Send { text: text.to_string() })?;

        let mut actions = Vec::new();
        self.convert_session_actions(session_actions, &mut actions);
        Ok(actions)
    }

    /// Drive reconnect deadlines.
    pub fn tick(&mut self, now: E::Instant) -> Vec<AppAction> {
        if self.session.is_none() {
            return vec![];
        }
        self.forward(SessionEvent::Tick { now })
    }

    /// Conversation of the mounted room. `None` if nothing is mounted.
    pub fn log(&self) -> Option<&MessageLog> {
        self.session.as_ref().map(Session::log)
    }

    /// Mounted room. `None` if nothing is mounted.
    pub fn room_id(&self) -> Option<RoomId> {
        self.session.as_ref().map(Session::room_id)
    }

    /// Connection state of the mounted room. `None` if nothing is mounted.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.session.as_ref().map(Session::connection_state)
    }

    /// Authenticated sender.
    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    /// Persistent connection notice, e.g. "disconnected" once retries are
    /// exhausted. `None` while healthy.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Handle a submitted line. Accepted lines clear the draft; rejected
    /// ones leave it for editing and set the status message.
    fn handle_line(&mut self, line: &str) -> Vec<AppAction> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(error) => {
                self.status_message = Some(error.to_string());
                return vec![AppAction::Render];
            },
        };

        let result = match command {
            Command::Say(text) => self.send(&text).map(|actions| {
                self.status_message = None;
                actions
            }),
            Command::Room(room_id) => self.mount(room_id, Vec::new()),
            Command::Leave => Ok(self.unmount()),
            Command::Quit => return self.handle(AppEvent::Quit),
            Command::Help => {
                self.status_message = Some(HELP.to_string());
                Ok(vec![AppAction::Render])
            },
        };

        match result {
            Ok(mut actions) => {
                actions.insert(0, AppAction::ClearInput);
                actions
            },
            Err(error) => {
                if error.is_validation() {
                    tracing::debug!(%error, "line rejected");
                } else {
                    tracing::warn!(%error, "line not sent");
                }
                self.status_message = Some(error.to_string());
                vec![AppAction::Render]
            },
        }
    }

    fn mount_or_report(&mut self, room_id: RoomId, history: Vec<ChatMessage>) -> Vec<AppAction> {
        match self.mount(room_id, history) {
            Ok(actions) => actions,
            Err(error) => {
                self.status_message = Some(error.to_string());
                vec![AppAction::Render]
            },
        }
    }

    /// Feed a transport or timer event to the mounted session.
    fn forward(&mut self, event: SessionEvent<E::Instant>) -> Vec<AppAction> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(?event, "no room mounted, event dropped");
            return vec![];
        };

        match session.handle(event) {
            Ok(session_actions) => {
                let mut actions = Vec::new();
                self.convert_session_actions(session_actions, &mut actions);
                actions
            },
            Err(error) => {
                tracing::warn!(%error, "session rejected event");
                self.status_message = Some(error.to_string());
                vec![AppAction::Render]
            },
        }
    }

    fn close_session(&mut self) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if let Some(mut session) = self.session.take() {
            let room_id = session.room_id();
            let session_actions = session.close();
            self.convert_session_actions(session_actions, &mut actions);
            tracing::info!(room_id, "room unmounted");
        }
        actions
    }

    /// Convert session actions to app actions, updating the banner.
    fn convert_session_actions(
        &mut self,
        session_actions: Vec<SessionAction>,
        actions: &mut Vec<AppAction>,
    ) {
        for action in session_actions {
            match action {
                SessionAction::Dial { url } => actions.push(AppAction::Dial { url }),
                SessionAction::Transmit(frame) => actions.push(AppAction::Transmit(frame)),
                SessionAction::Disconnect => actions.push(AppAction::Disconnect),
                SessionAction::LogChanged => push_render(actions),
                SessionAction::ConnectionChanged(state) => {
                    match state {
                        ConnectionState::Open => self.banner = None,
                        ConnectionState::Connecting if self.banner.is_none() => {
                            self.banner = Some("connecting".to_string());
                        },
                        ConnectionState::Idle
                        | ConnectionState::Connecting
                        | ConnectionState::Reconnecting
                        | ConnectionState::Closed => {},
                    }
                    push_render(actions);
                },
                SessionAction::ReconnectScheduled { attempt, delay } => {
                    self.banner = Some(format!(
                        "connection lost, retry {attempt} in {} ms",
                        delay.as_millis()
                    ));
                    push_render(actions);
                },
                SessionAction::ConnectionLost(error) => {
                    self.banner = Some(format!("disconnected: {error}"));
                    push_render(actions);
                },
            }
        }
    }
}

/// Append a render unless one is already queued.
fn push_render(actions: &mut Vec<AppAction>) {
    if !actions.contains(&AppAction::Render) {
        actions.push(AppAction::Render);
    }
}

impl<E: Environment> std::fmt::Debug for ChatProvider<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProvider")
            .field("sender_id", &self.sender_id)
            .field("session", &self.session)
            .field("banner", &self.banner)
            .field("status_message", &self.status_message)
            .finish_non_exhaustive()
    }
}
