//! Production Environment implementation using system time and RNG.
//!
//! Nonces only need to be unique per process, so the thread-local `rand` RNG
//! is sufficient. Nothing here is reproducible; tests use
//! [`belay_core::env::test_utils::ManualEnv`] instead.

use std::time::Instant;

use belay_core::Environment;
use chrono::{DateTime, Utc};
use rand::RngCore;

/// Production environment using system clocks and the thread RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::rng().fill_bytes(buffer);
    }
}
