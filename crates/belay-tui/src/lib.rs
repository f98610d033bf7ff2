//! Terminal client for Belay room chat
//!
//! A thin shell over [`belay_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`belay_app::Runtime`].
//!
//! This crate handles keyboard input, rendering, the WebSocket transport, and
//! loading a room's history from disk.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod history;
pub mod input;
pub mod system_env;
pub mod terminal;
pub mod ui;

pub use belay_app::{AppAction, AppEvent, ChatProvider, Driver, ProviderConfig, Runtime};
pub use history::HistoryError;
pub use input::{InputState, KeyInput};
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
