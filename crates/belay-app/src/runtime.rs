//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`ChatProvider`]: Room session owner
//! - [`Driver`]: Platform-specific I/O

use std::collections::VecDeque;

use belay_core::Environment;

use crate::{AppAction, AppEvent, ChatProvider, Driver, TransportEvent};

/// Generic runtime that orchestrates the provider and a driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for time and randomness
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    provider: ChatProvider<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver and provider.
    pub fn new(driver: D, provider: ChatProvider<E>) -> Self {
        Self { driver, provider }
    }

    /// Run the main event loop until the provider asks to quit.
    ///
    /// Each cycle:
    /// 1. Polls for an input event from the driver
    /// 2. Drains ready transport events
    /// 3. Ticks the provider so reconnect deadlines fire
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll input or render. Transport
    /// failures are not errors; they are fed back to the provider.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.provider)?;

        loop {
            if self.process_cycle().await? {
                break;
            }
        }

        self.driver.disconnect();
        Ok(())
    }

    /// Feed one event to the provider and execute the resulting actions.
    ///
    /// Returns `true` if the application should quit.
    pub async fn dispatch(&mut self, event: AppEvent) -> Result<bool, D::Error> {
        let actions = self.provider.handle(event);
        self.process_actions(actions).await
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.dispatch(event).await?
        {
            return Ok(true);
        }

        while let Some(transport_event) = self.driver.recv_transport() {
            let event = match transport_event {
                TransportEvent::Frame(frame) => AppEvent::FrameReceived(frame),
                TransportEvent::Closed { reason } => AppEvent::TransportClosed { reason },
            };
            if self.dispatch(event).await? {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        let actions = self.provider.tick(now);
        self.process_actions(actions).await
    }

    /// Execute actions returned by the provider, feeding transport outcomes
    /// back until nothing is left.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending: VecDeque<AppAction> = initial_actions.into();
        let mut quit = false;

        while let Some(action) = pending.pop_front() {
            match action {
                AppAction::Render => self.driver.render(&self.provider)?,
                AppAction::Quit => quit = true,
                AppAction::Dial { url } => {
                    let event = match self.driver.dial(&url).await {
                        Ok(()) => AppEvent::Opened,
                        Err(error) => {
                            tracing::warn!(%url, %error, "dial failed");
                            AppEvent::DialFailed { reason: error.to_string() }
                        },
                    };
                    pending.extend(self.provider.handle(event));
                },
                AppAction::Transmit(frame) => {
                    if let Err(error) = self.driver.send_frame(frame.clone()).await {
                        tracing::warn!(%error, "transport send failed");
                        self.driver.disconnect();
                        let event = AppEvent::TransmitFailed { frame, reason: error.to_string() };
                        pending.extend(self.provider.handle(event));
                    }
                },
                AppAction::Disconnect => self.driver.disconnect(),
                AppAction::ClearInput => self.driver.clear_input(),
            }
        }

        Ok(quit)
    }

    /// Get a reference to the provider
    pub fn provider(&self) -> &ChatProvider<E> {
        &self.provider
    }

    /// Get a mutable reference to the provider
    pub fn provider_mut(&mut self) -> &mut ChatProvider<E> {
        &mut self.provider
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
