//! Transport-layer errors and close reasons.

use thiserror::Error;

/// Errors from opening or driving a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying connection could not be established or was lost.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The shared-memory region or file descriptor required by the
    /// transport could not be opened or mapped.
    #[error("shared memory unavailable: {0}")]
    SharedMemoryUnavailable(String),
}

/// Why a stream's transport connection ended.
///
/// Distinct from [`TransportError`]: a close reason is reported through the
/// `closed` callback/signal even for reasons that are not themselves errors
/// opening a new connection (e.g. a clean remote close).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The guest closed the connection cleanly.
    RemoteClosed,
    /// The underlying transport failed (see [`TransportError`]).
    TransportError,
    /// The guest rejected the session's credentials or ticket.
    AuthenticationFailed,
    /// The shared-memory region backing this connection became unavailable.
    SharedMemoryUnavailable,
}

impl CloseReason {
    /// Authentication failures and shared-memory unavailability are terminal:
    /// the per-window stream must not attempt a reconnect for these.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::AuthenticationFailed | Self::SharedMemoryUnavailable)
    }
}
