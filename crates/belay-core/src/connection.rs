//! Connection manager state machine.
//!
//! Owns the lifecycle of the single live transport behind one room session:
//! dialing, reconnecting with bounded exponential backoff, and closing. Uses
//! the action pattern: methods take time as input and return actions for the
//! driver to execute. The driver owns the socket; this type only decides what
//! should happen to it.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐  opened   ┌──────┐
//! │ Idle │────────>│ Connecting │──────────>│ Open │
//! └──────┘         └────────────┘           └──────┘
//!                     ↑      │ dial failed      │ transport closed
//!        retry due    │      ↓                  ↓
//!  (tick)          ┌──────────────┐<────────────┘
//!                  │ Reconnecting │
//!                  └──────────────┘
//!                         │ budget exhausted
//!                         ↓
//!                    ┌────────┐
//!                    │ Closed │  (also from any state via close())
//!                    └────────┘
//! ```
//!
//! `Closed` is terminal. Reconnecting after an explicit close requires a new
//! `Connection`.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use belay_proto::{Frame, RoomId};

use crate::{BackoffPolicy, ConnectionError, Observers};

/// Default chat endpoint. The room id is appended as the last path segment.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws/chat";

/// Default number of reconnect attempts after a failure.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Actions returned by the connection state machine.
///
/// The driver executes these actions:
/// - `Dial`: Open a transport to `url` and report back `opened` or
///   `dial_failed`
/// - `Transmit`: Write the frame to the open transport
/// - `Disconnect`: Drop the transport without waiting
/// - `StateChanged`, `RetryScheduled`, `Lost`: Informational, for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport to this target.
    Dial {
        /// Transport target built from the endpoint and room id
        url: String,
        /// 0 for the first dial, n for the n-th retry
        attempt: u32,
    },

    /// Send this frame over the open transport.
    Transmit(Frame),

    /// Release the transport.
    Disconnect,

    /// The connection moved to a new state.
    StateChanged(ConnectionState),

    /// A retry will be dialed once `delay` has elapsed.
    RetryScheduled {
        /// Retry number (1-based)
        attempt: u32,
        /// Wait before dialing
        delay: Duration,
    },

    /// Retry budget exhausted. The connection is now closed.
    Lost(ConnectionError),
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Constructed, not yet asked to connect
    Idle,
    /// Dial in progress
    Connecting,
    /// Transport open; sends are accepted
    Open,
    /// Waiting out a backoff delay before the next dial
    Reconnecting,
    /// Terminal
    Closed,
}

impl ConnectionState {
    /// Short lowercase label for display and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL; the room id is appended as `{endpoint}/{room_id}`
    pub endpoint: String,
    /// Delay schedule between reconnect attempts
    pub backoff: BackoffPolicy,
    /// Reconnect attempts allowed after a failure before giving up
    pub max_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            backoff: BackoffPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ConnectionConfig {
    /// Transport target for a room.
    pub fn url_for(&self, room_id: RoomId) -> String {
        format!("{}/{room_id}", self.endpoint.trim_end_matches('/'))
    }
}

/// Connection state machine
///
/// Manages dialing, reconnects, and closing for the transport of one room.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Room this connection serves
    room_id: RoomId,
    /// Transport target
    url: String,
    /// Current state
    state: ConnectionState,
    /// Configuration
    config: ConnectionConfig,
    /// Reconnect attempts since the last successful open
    attempts: u32,
    /// Whether this instance has ever reached `Open`
    ever_opened: bool,
    /// When the pending retry was scheduled, and how long to wait
    retry: Option<(I, Duration)>,
    /// Inbound frame observers
    message_observers: Observers<Frame>,
    /// State change observers
    state_observers: Observers<ConnectionState>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new connection in [`ConnectionState::Idle`] for `room_id`.
    pub fn new(room_id: RoomId, config: ConnectionConfig) -> Self {
        let url = config.url_for(room_id);
        Self {
            room_id,
            url,
            state: ConnectionState::Idle,
            config,
            attempts: 0,
            ever_opened: false,
            retry: None,
            message_observers: Observers::new(),
            state_observers: Observers::new(),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Room this connection serves.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Transport target.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reconnect attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time left until the pending retry is due. `None` unless reconnecting.
    pub fn retry_due_in(&self, now: I) -> Option<Duration> {
        self.retry.map(|(scheduled_at, delay)| delay.saturating_sub(now - scheduled_at))
    }

    /// Register an observer for inbound frames accepted while open.
    pub fn on_message(&mut self, handler: impl FnMut(&Frame) + Send + 'static) {
        self.message_observers.register(handler);
    }

    /// Register an observer for state transitions.
    pub fn on_state_change(&mut self, handler: impl FnMut(&ConnectionState) + Send + 'static) {
        self.state_observers.register(handler);
    }

    /// Start connecting.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in Idle state
    pub fn connect(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Idle {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "connect" });
        }

        tracing::info!(room_id = self.room_id, url = %self.url, "connecting");

        let mut actions = Vec::new();
        self.transition(ConnectionState::Connecting, &mut actions);
        actions.push(ConnectionAction::Dial { url: self.url.clone(), attempt: 0 });
        Ok(actions)
    }

    /// Transport reported open.
    ///
    /// After `close()` the late socket is released immediately.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless Connecting or Closed
    pub fn handle_opened(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Connecting => {
                let mut actions = Vec::new();
                self.attempts = 0;
                self.ever_opened = true;
                self.retry = None;
                self.transition(ConnectionState::Open, &mut actions);
                tracing::info!(room_id = self.room_id, "connection open");
                Ok(actions)
            },
            ConnectionState::Closed => Ok(vec![ConnectionAction::Disconnect]),
            state => Err(ConnectionError::InvalidState { state, operation: "handle_opened" }),
        }
    }

    /// Dial attempt failed.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless Connecting or Closed
    pub fn handle_dial_failed(
        &mut self,
        now: I,
        reason: &str,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Connecting => Ok(self.fail(now, reason)),
            ConnectionState::Closed => Ok(vec![]),
            state => Err(ConnectionError::InvalidState { state, operation: "handle_dial_failed" }),
        }
    }

    /// Transport closed without the caller asking (error or server close).
    ///
    /// Ignored unless a transport is live or being dialed.
    pub fn handle_transport_closed(&mut self, now: I, reason: &str) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => self.fail(now, reason),
            ConnectionState::Idle | ConnectionState::Reconnecting | ConnectionState::Closed => {
                tracing::debug!(room_id = self.room_id, state = ?self.state, "stale close ignored");
                vec![]
            },
        }
    }

    /// Process periodic maintenance: dial the pending retry once it is due.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        if self.state != ConnectionState::Reconnecting {
            return actions;
        }

        let Some((scheduled_at, delay)) = self.retry else {
            return actions;
        };

        if now - scheduled_at >= delay {
            self.retry = None;
            self.transition(ConnectionState::Connecting, &mut actions);
            actions.push(ConnectionAction::Dial { url: self.url.clone(), attempt: self.attempts });
        }

        actions
    }

    /// Hand a frame to the open transport.
    ///
    /// Never queues: while not open the frame is refused.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotOpen` if not in Open state
    pub fn send(&self, frame: Frame) -> Result<ConnectionAction, ConnectionError> {
        if self.state != ConnectionState::Open {
            return Err(ConnectionError::NotOpen { state: self.state });
        }
        Ok(ConnectionAction::Transmit(frame))
    }

    /// Deliver an inbound frame to message observers.
    ///
    /// Returns false (frame dropped) unless open.
    pub fn handle_frame(&mut self, frame: &Frame) -> bool {
        if self.state != ConnectionState::Open {
            tracing::debug!(room_id = self.room_id, state = ?self.state, "frame dropped");
            return false;
        }
        self.message_observers.notify(frame);
        true
    }

    /// Close the connection. Idempotent.
    ///
    /// Cancels any pending retry. Emits `Disconnect` when a transport may
    /// exist.
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        match self.state {
            ConnectionState::Closed => return actions,
            ConnectionState::Idle => {},
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Reconnecting => {
                actions.push(ConnectionAction::Disconnect);
            },
        }

        self.retry = None;
        self.transition(ConnectionState::Closed, &mut actions);
        tracing::info!(room_id = self.room_id, "connection closed");
        actions
    }

    /// Record a failure and either schedule a retry or give up.
    fn fail(&mut self, now: I, reason: &str) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        if self.attempts < self.config.max_attempts {
            self.attempts += 1;
            let delay = self.config.backoff.delay(self.attempts);
            self.retry = Some((now, delay));

            tracing::warn!(
                room_id = self.room_id,
                attempt = self.attempts,
                ?delay,
                %reason,
                "transport failed, scheduling reconnect"
            );

            self.transition(ConnectionState::Reconnecting, &mut actions);
            actions.push(ConnectionAction::RetryScheduled { attempt: self.attempts, delay });
            return actions;
        }

        let error = if self.ever_opened {
            ConnectionError::ConnectionLost { attempts: self.attempts, reason: reason.to_string() }
        } else {
            ConnectionError::ConnectFailed {
                attempts: self.attempts + 1,
                reason: reason.to_string(),
            }
        };

        tracing::warn!(room_id = self.room_id, %error, "retry budget exhausted");

        self.retry = None;
        self.transition(ConnectionState::Closed, &mut actions);
        actions.push(ConnectionAction::Lost(error));
        actions
    }

    fn transition(&mut self, next: ConnectionState, actions: &mut Vec<ConnectionAction>) {
        if self.state == next {
            return;
        }

        tracing::debug!(room_id = self.room_id, from = ?self.state, to = ?next, "state change");

        self.state = next;
        self.state_observers.notify(&next);
        actions.push(ConnectionAction::StateChanged(next));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            endpoint: "ws://chat.test/ws/".to_string(),
            backoff: BackoffPolicy {
                base: Duration::from_millis(100),
                max: Duration::from_millis(400),
            },
            max_attempts: 3,
        }
    }

    fn open_connection() -> Connection {
        let mut conn = Connection::new(42, config());
        conn.connect().unwrap();
        conn.handle_opened().unwrap();
        assert_eq!(conn.state(), ConnectionState::Open);
        conn
    }

    #[test]
    fn connection_lifecycle() {
        let mut conn: Connection = Connection::new(42, config());

        // Initial state
        assert_eq!(conn.state(), ConnectionState::Idle);
        assert_eq!(conn.url(), "ws://chat.test/ws/42");

        // Connect
        let actions = conn.connect().unwrap();
        assert_eq!(actions, vec![
            ConnectionAction::StateChanged(ConnectionState::Connecting),
            ConnectionAction::Dial { url: "ws://chat.test/ws/42".to_string(), attempt: 0 },
        ]);

        // Opened
        let actions = conn.handle_opened().unwrap();
        assert_eq!(actions, vec![ConnectionAction::StateChanged(ConnectionState::Open)]);

        // Close
        let actions = conn.close();
        assert_eq!(actions, vec![
            ConnectionAction::Disconnect,
            ConnectionAction::StateChanged(ConnectionState::Closed),
        ]);
    }

    #[test]
    fn connect_twice_is_invalid() {
        let mut conn: Connection = Connection::new(1, config());
        conn.connect().unwrap();

        let result = conn.connect();
        assert!(matches!(result, Err(ConnectionError::InvalidState { operation: "connect", .. })));
    }

    #[test]
    fn send_requires_open() {
        let mut conn: Connection = Connection::new(1, config());
        let frame = Frame::from("{}");

        assert_eq!(
            conn.send(frame.clone()),
            Err(ConnectionError::NotOpen { state: ConnectionState::Idle })
        );

        conn.connect().unwrap();
        assert_eq!(
            conn.send(frame.clone()),
            Err(ConnectionError::NotOpen { state: ConnectionState::Connecting })
        );

        conn.handle_opened().unwrap();
        assert_eq!(conn.send(frame.clone()), Ok(ConnectionAction::Transmit(frame)));
    }

    #[test]
    fn unexpected_close_reconnects_with_backoff() {
        let t0 = Instant::now();
        let mut conn = open_connection();

        let actions = conn.handle_transport_closed(t0, "reset by peer");
        assert_eq!(conn.state(), ConnectionState::Reconnecting);
        assert!(actions.contains(&ConnectionAction::RetryScheduled {
            attempt: 1,
            delay: Duration::from_millis(100),
        }));

        // Not due yet
        assert!(conn.tick(t0 + Duration::from_millis(50)).is_empty());
        assert_eq!(conn.retry_due_in(t0 + Duration::from_millis(50)), Some(Duration::from_millis(50)));

        // Due
        let actions = conn.tick(t0 + Duration::from_millis(100));
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(actions.contains(&ConnectionAction::Dial {
            url: "ws://chat.test/ws/42".to_string(),
            attempt: 1,
        }));

        // Reopened resets the budget
        conn.handle_opened().unwrap();
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(conn.attempts(), 0);
    }

    #[test]
    fn delays_grow_and_cap() {
        let t0 = Instant::now();
        let mut conn = open_connection();
        let mut now = t0;
        let mut delays = Vec::new();

        let mut actions = conn.handle_transport_closed(now, "reset");
        loop {
            let Some(delay) = actions.iter().find_map(|a| match a {
                ConnectionAction::RetryScheduled { delay, .. } => Some(*delay),
                _ => None,
            }) else {
                break;
            };
            delays.push(delay);
            now += delay;
            conn.tick(now);
            actions = conn.handle_dial_failed(now, "refused").unwrap();
        }

        assert_eq!(delays, vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
        ]);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(matches!(
            actions.last(),
            Some(ConnectionAction::Lost(ConnectionError::ConnectionLost { attempts: 3, .. }))
        ));
    }

    #[test]
    fn initial_dial_exhaustion_is_connect_failed() {
        let t0 = Instant::now();
        let mut conn: Connection = Connection::new(9, config());
        conn.connect().unwrap();

        let mut now = t0;
        let mut last = Vec::new();
        for _ in 0..=3 {
            last = conn.handle_dial_failed(now, "refused").unwrap();
            now += Duration::from_secs(1);
            conn.tick(now);
        }

        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(matches!(
            last.last(),
            Some(ConnectionAction::Lost(ConnectionError::ConnectFailed { attempts: 4, .. }))
        ));
    }

    #[test]
    fn close_is_idempotent_and_cancels_retry() {
        let t0 = Instant::now();
        let mut conn = open_connection();
        conn.handle_transport_closed(t0, "reset");

        let first = conn.close();
        assert!(first.contains(&ConnectionAction::Disconnect));
        assert!(conn.close().is_empty());

        // Retry never fires after close
        assert!(conn.tick(t0 + Duration::from_secs(60)).is_empty());
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.retry_due_in(t0), None);
    }

    #[test]
    fn close_from_idle_has_no_transport_to_release() {
        let mut conn: Connection = Connection::new(1, config());
        assert_eq!(conn.close(), vec![ConnectionAction::StateChanged(ConnectionState::Closed)]);
    }

    #[test]
    fn late_open_after_close_is_released() {
        let mut conn: Connection = Connection::new(1, config());
        conn.connect().unwrap();
        conn.close();

        assert_eq!(conn.handle_opened(), Ok(vec![ConnectionAction::Disconnect]));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn stale_transport_close_is_ignored() {
        let t0 = Instant::now();
        let mut conn = open_connection();
        conn.close();

        assert!(conn.handle_transport_closed(t0, "late").is_empty());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn frames_only_delivered_while_open() {
        let t0 = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut conn = open_connection();
        {
            let seen = Arc::clone(&seen);
            conn.on_message(move |frame| seen.lock().unwrap().push(frame.as_str().to_owned()));
        }

        assert!(conn.handle_frame(&Frame::from("one")));
        conn.handle_transport_closed(t0, "reset");
        assert!(!conn.handle_frame(&Frame::from("two")));

        assert_eq!(*seen.lock().unwrap(), vec!["one".to_string()]);
    }

    #[test]
    fn state_observers_see_every_transition_in_order() {
        let t0 = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut conn: Connection = Connection::new(5, config());

        for tag in ["a", "b"] {
            let log = Arc::clone(&log);
            conn.on_state_change(move |state| log.lock().unwrap().push((tag, *state)));
        }

        conn.connect().unwrap();
        conn.handle_opened().unwrap();
        conn.handle_transport_closed(t0, "reset");
        conn.close();

        let log = log.lock().unwrap();
        assert_eq!(*log, vec![
            ("a", ConnectionState::Connecting),
            ("b", ConnectionState::Connecting),
            ("a", ConnectionState::Open),
            ("b", ConnectionState::Open),
            ("a", ConnectionState::Reconnecting),
            ("b", ConnectionState::Reconnecting),
            ("a", ConnectionState::Closed),
            ("b", ConnectionState::Closed),
        ]);
    }
}
