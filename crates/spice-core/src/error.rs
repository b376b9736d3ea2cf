//! Errors surfaced by the stream state machine and control channel.

use spice_transport::CloseReason;
use thiserror::Error;

/// Terminal or caller-facing errors from a per-window stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The stream's transport connection ended for a reason that will not be
    /// retried (authentication failure or shared-memory unavailability).
    #[error("stream closed: {0:?}")]
    Closed(CloseReason),
}

/// Errors from a control-channel request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The channel's transport has not reported a connected state yet.
    #[error("control channel is not connected")]
    NotConnected,

    /// No response arrived before the request's deadline.
    #[error("control request timed out")]
    Timeout,

    /// The request could not be written to the transport.
    #[error("failed to send control request: {0}")]
    SendFailed(String),

    /// A response arrived but did not match the pending request.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The guest responded with an `error` message.
    #[error("guest reported error {code}: {message}")]
    GuestError {
        /// Guest-defined error code.
        code: u32,
        /// Human-readable error description.
        message: String,
    },
}
