//! Protocol-layer errors (C1/C2).

use thiserror::Error;

/// Errors from message-type validation and envelope encode/decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Byte does not correspond to any known message type.
    #[error("invalid message type: {0:#04x}")]
    InvalidMessageType(u8),

    /// A recognized type byte was received in the wrong direction.
    #[error("unexpected direction for type byte {byte:#04x}")]
    UnexpectedDirection {
        /// The offending type byte.
        byte: u8,
    },

    /// Guest protocol version is not compatible with the host's.
    #[error("incompatible protocol version: host {host_major}.{host_minor}, guest {guest_major}.{guest_minor}")]
    IncompatibleVersion {
        /// Host major version.
        host_major: u16,
        /// Host minor version.
        host_minor: u16,
        /// Guest major version.
        guest_major: u16,
        /// Guest minor version.
        guest_minor: u16,
    },

    /// Payload could not be serialized.
    #[error("serialize failed: {0}")]
    SerializeFailed(String),

    /// Payload could not be deserialized.
    #[error("deserialize failed: {0}")]
    DeserializeFailed(String),
}
