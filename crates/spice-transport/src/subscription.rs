//! The scoped resource returned by a successful `open_stream`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A handle to an open transport stream.
///
/// Dropping a `Subscription` does not itself release the underlying
/// resource — the owning [`crate::Transport`] impl releases it exactly once
/// when `close_stream` is called, or when the subscription's drop guard
/// (held internally by the transport, not here) runs during teardown. This
/// type is `Clone` so callers can hand the same subscription to both the
/// stream and any bookkeeping that needs to reference it without closing it
/// twice by accident: only one `close_stream` call is expected to win.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self { id, closed: Arc::new(AtomicBool::new(false)) }
    }

    /// Builds a `Subscription` outside of a real transport, for tests in
    /// downstream crates that need to simulate a successful `open_stream`.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn for_test(id: u64) -> Self {
        Self::new(id)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mark this subscription closed. Returns `true` the first time it is
    /// called, `false` on every subsequent call — used by transports to
    /// guarantee exactly-once release.
    pub(crate) fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
