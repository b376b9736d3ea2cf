//! Environment abstraction for deterministic testing.
//!
//! Decouples the stream/router/control-channel state machines from real time
//! and randomness, so their logic can be exercised in tests without actually
//! sleeping through a reconnect backoff.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic: must never go backwards within one run).
    fn now(&self) -> Self::Instant;

    /// Sleeps for `duration`. The only async method in the trait; only
    /// driver code calls it, never the pure state-machine `handle` methods.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills `buffer` with random bytes (used for message-id/session jitter
    /// where applicable).
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Convenience: a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Production environment: real monotonic time, real async sleep, OS RNG.
#[derive(Clone, Copy, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnvironment {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable, this process cannot mint message ids safely");
    }
}
