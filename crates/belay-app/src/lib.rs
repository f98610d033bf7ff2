//! Application layer for Belay chat
//!
//! The chat provider that scopes a room session to a mounted room view, plus
//! the driver abstraction and generic runtime that execute its actions. The
//! same runtime code runs in the terminal client and in scripted tests.
//!
//! # Components
//!
//! - [`ChatProvider`]: Owns at most one [`belay_client::Session`]; exposes
//!   `send` and a read-only log view
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`Command`]: Parsed line of user input

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod driver;
mod event;
mod input;
mod provider;
mod runtime;

pub use action::AppAction;
pub use driver::{Driver, TransportEvent};
pub use event::AppEvent;
pub use input::{Command, InputError};
pub use provider::{ChatProvider, ProviderConfig};
pub use runtime::Runtime;
