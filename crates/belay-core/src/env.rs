//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (clocks, randomness). Tests
//! use a manual clock and a counter RNG; the terminal client uses real system
//! resources.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` never repeats a sequence within one process in
///   production (nonces are derived from it)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`, tests use a virtual instant that
    /// only moves when the test advances it.
    type Instant: Copy + Ord + Send + Sync + std::fmt::Debug + std::ops::Sub<Output = Duration>;

    /// Current monotonic time. Used for retry deadlines and echo windows.
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time. Stamped onto outgoing messages.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a client nonce: 16 lowercase hex characters.
    fn nonce(&self) -> String {
        format!("{:016x}", self.random_u64())
    }
}

/// Deterministic environment for tests and simulations.
pub mod test_utils {
    use std::{
        ops::{Add, Sub},
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use chrono::{DateTime, Utc};

    use super::Environment;

    /// Wall-clock reading at virtual time zero: 2024-05-01T09:30:00Z.
    pub const EPOCH_SECS: i64 = 1_714_555_800;

    /// Virtual monotonic instant, measured from the environment's start.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct VirtualInstant(Duration);

    impl VirtualInstant {
        /// Instant at `offset` past the start.
        pub fn from_offset(offset: Duration) -> Self {
            Self(offset)
        }

        /// Offset from the start.
        pub fn offset(self) -> Duration {
            self.0
        }
    }

    impl Sub for VirtualInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            self.0.saturating_sub(rhs.0)
        }
    }

    impl Add<Duration> for VirtualInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self {
            Self(self.0.saturating_add(rhs))
        }
    }

    /// Manual clock plus counter RNG. Clones share the same clock.
    #[derive(Debug, Clone, Default)]
    pub struct ManualEnv {
        elapsed_nanos: Arc<AtomicU64>,
        counter: Arc<AtomicU64>,
    }

    impl ManualEnv {
        /// Fresh environment at virtual time zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
            self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
        }

        fn elapsed(&self) -> Duration {
            Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
        }
    }

    impl Environment for ManualEnv {
        type Instant = VirtualInstant;

        fn now(&self) -> VirtualInstant {
            VirtualInstant(self.elapsed())
        }

        fn wall_clock(&self) -> DateTime<Utc> {
            let start = DateTime::from_timestamp(EPOCH_SECS, 0).unwrap_or_default();
            let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or_default();
            start + elapsed
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let bytes = next.to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = bytes[i % bytes.len()];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Instant,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct CountingEnv {
        counter: Arc<AtomicU64>,
    }

    impl Environment for CountingEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn wall_clock(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(0, 0).unwrap_or_default()
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            let bytes = next.to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = bytes[i % bytes.len()];
            }
        }
    }

    #[test]
    fn nonce_is_sixteen_hex_chars() {
        let env = CountingEnv::default();
        let nonce = env.nonce();

        assert_eq!(nonce, "0000000000000001");
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn nonces_differ_between_calls() {
        let env = CountingEnv::default();
        assert_ne!(env.nonce(), env.nonce());
    }

    #[test]
    fn manual_env_moves_only_when_advanced() {
        let env = test_utils::ManualEnv::new();
        let start = env.now();
        let shared = env.clone();

        assert_eq!(env.now(), start);
        shared.advance(Duration::from_millis(250));

        assert_eq!(env.now() - start, Duration::from_millis(250));
        assert_eq!(env.wall_clock().to_rfc3339(), "2024-05-01T09:30:00.250+00:00");
    }
}
