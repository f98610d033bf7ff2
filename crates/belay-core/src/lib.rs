//! Belay core
//!
//! Sans-IO building blocks shared by the chat session and its drivers.
//!
//! # Components
//!
//! - [`connection::Connection`]: Per-room connection state machine with
//!   bounded exponential reconnect
//! - [`backoff::BackoffPolicy`]: Retry delay schedule
//! - [`observer::Observers`]: Ordered callback registry
//! - [`env::Environment`]: Time and randomness abstraction for deterministic
//!   tests
//!
//! Nothing in this crate performs I/O. Methods take the current time as input
//! and return actions for the caller to execute.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backoff;
pub mod connection;
pub mod env;
pub mod error;
pub mod observer;

pub use backoff::BackoffPolicy;
pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
pub use env::Environment;
pub use error::ConnectionError;
pub use observer::Observers;
