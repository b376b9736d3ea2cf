//! Typed payloads, one variant per message type, dispatched by the wire
//! type byte (no redundant tag inside the JSON payload itself).

pub mod guest;
pub mod host;
pub mod shared;

use bytes::Bytes;

use crate::{envelope::RawEnvelope, error::ProtocolError, message_type::MessageType};

/// A host-to-guest message (payload for a `0x00..=0x7F` type byte).
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// Launch a program in the guest session.
    LaunchProgram(host::LaunchProgram),
    /// Request an executable's icon.
    RequestIcon(host::RequestIcon),
    /// Push clipboard content to the guest.
    ClipboardData(host::ClipboardData),
    /// Inject a mouse event.
    MouseInput(host::MouseInput),
    /// Inject a keyboard event.
    KeyboardInput(host::KeyboardInput),
    /// Inject a drag-and-drop event.
    DragDropEvent(host::DragDropEvent),
    /// Request the guest's current sessions.
    ListSessions(host::ListSessions),
    /// Ask the guest to close a session.
    CloseSession(host::CloseSession),
    /// Request the guest's configured shortcuts.
    ListShortcuts(host::ListShortcuts),
    /// Ask the guest to shut down.
    Shutdown(host::Shutdown),
}

impl HostMessage {
    /// The wire message type this variant encodes as.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::LaunchProgram(_) => MessageType::LaunchProgram,
            Self::RequestIcon(_) => MessageType::RequestIcon,
            Self::ClipboardData(_) => MessageType::ClipboardData,
            Self::MouseInput(_) => MessageType::MouseInput,
            Self::KeyboardInput(_) => MessageType::KeyboardInput,
            Self::DragDropEvent(_) => MessageType::DragDropEvent,
            Self::ListSessions(_) => MessageType::ListSessions,
            Self::CloseSession(_) => MessageType::CloseSession,
            Self::ListShortcuts(_) => MessageType::ListShortcuts,
            Self::Shutdown(_) => MessageType::Shutdown,
        }
    }

    fn encode_payload(&self) -> Result<Bytes, ProtocolError> {
        let vec = match self {
            Self::LaunchProgram(p) => serde_json::to_vec(p),
            Self::RequestIcon(p) => serde_json::to_vec(p),
            Self::ClipboardData(p) => serde_json::to_vec(p),
            Self::MouseInput(p) => serde_json::to_vec(p),
            Self::KeyboardInput(p) => serde_json::to_vec(p),
            Self::DragDropEvent(p) => serde_json::to_vec(p),
            Self::ListSessions(p) => serde_json::to_vec(p),
            Self::CloseSession(p) => serde_json::to_vec(p),
            Self::ListShortcuts(p) => serde_json::to_vec(p),
            Self::Shutdown(p) => serde_json::to_vec(p),
        }
        .map_err(|e| ProtocolError::SerializeFailed(e.to_string()))?;
        Ok(Bytes::from(vec))
    }

    /// Encode this message into a framed envelope.
    pub fn into_envelope(&self) -> Result<RawEnvelope, ProtocolError> {
        Ok(RawEnvelope::new(self.message_type().as_byte(), self.encode_payload()?))
    }
}

/// A guest-to-host message (payload for a `0x80..=0xFF` type byte).
#[derive(Debug, Clone, PartialEq)]
pub enum GuestMessage {
    /// A window lifecycle notification.
    WindowMetadata(guest::WindowMetadata),
    /// A `frameData` header; raw pixel bytes follow in the byte stream.
    FrameData(guest::FrameDataHeader),
    /// Guest-reported feature capability bitmask.
    CapabilityFlags(guest::CapabilityFlags),
    /// DPI information for a window.
    DpiInfo(guest::DpiInfo),
    /// Icon pixel data.
    IconData(guest::IconData),
    /// A configured shortcut the guest detected.
    ShortcutDetected(guest::ShortcutDetected),
    /// Guest clipboard content changed.
    ClipboardChanged(guest::ClipboardChanged),
    /// Periodic liveness signal.
    Heartbeat(guest::Heartbeat),
    /// A guest-collected telemetry metric.
    TelemetryReport(guest::TelemetryReport),
    /// Provisioning progress update.
    ProvisionProgress(guest::ProvisionProgress),
    /// A provisioning step failed.
    ProvisionError(guest::ProvisionError),
    /// Provisioning finished successfully.
    ProvisionComplete(guest::ProvisionComplete),
    /// Response to a `listSessions` request.
    SessionList(guest::SessionList),
    /// Response to a `listShortcuts` request.
    ShortcutList(guest::ShortcutList),
    /// Notifies the host that a new frame is ready in shared memory.
    FrameReady(guest::FrameReady),
    /// Describes or re-describes a window's shared-memory frame buffer.
    WindowBufferAllocated(guest::WindowBufferAllocated),
    /// A guest-reported error.
    Error(guest::Error),
    /// Generic acknowledgement of a prior request.
    Ack(guest::Ack),
}

impl GuestMessage {
    /// The wire message type this variant decodes from.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::WindowMetadata(_) => MessageType::WindowMetadata,
            Self::FrameData(_) => MessageType::FrameData,
            Self::CapabilityFlags(_) => MessageType::CapabilityFlags,
            Self::DpiInfo(_) => MessageType::DpiInfo,
            Self::IconData(_) => MessageType::IconData,
            Self::ShortcutDetected(_) => MessageType::ShortcutDetected,
            Self::ClipboardChanged(_) => MessageType::ClipboardChanged,
            Self::Heartbeat(_) => MessageType::Heartbeat,
            Self::TelemetryReport(_) => MessageType::TelemetryReport,
            Self::ProvisionProgress(_) => MessageType::ProvisionProgress,
            Self::ProvisionError(_) => MessageType::ProvisionError,
            Self::ProvisionComplete(_) => MessageType::ProvisionComplete,
            Self::SessionList(_) => MessageType::SessionList,
            Self::ShortcutList(_) => MessageType::ShortcutList,
            Self::FrameReady(_) => MessageType::FrameReady,
            Self::WindowBufferAllocated(_) => MessageType::WindowBufferAllocated,
            Self::Error(_) => MessageType::Error,
            Self::Ack(_) => MessageType::Ack,
        }
    }

    /// Decode a guest-directed payload given its message type and raw bytes.
    fn decode_payload(message_type: MessageType, bytes: &[u8]) -> Result<Self, ProtocolError> {
        let map_err = |e: serde_json::Error| ProtocolError::DeserializeFailed(e.to_string());
        Ok(match message_type {
            MessageType::WindowMetadata => {
                Self::WindowMetadata(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::FrameData => {
                Self::FrameData(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::CapabilityFlags => {
                Self::CapabilityFlags(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::DpiInfo => Self::DpiInfo(serde_json::from_slice(bytes).map_err(map_err)?),
            MessageType::IconData => {
                Self::IconData(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ShortcutDetected => {
                Self::ShortcutDetected(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ClipboardChanged => {
                Self::ClipboardChanged(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::Heartbeat => {
                Self::Heartbeat(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::TelemetryReport => {
                Self::TelemetryReport(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ProvisionProgress => {
                Self::ProvisionProgress(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ProvisionError => {
                Self::ProvisionError(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ProvisionComplete => {
                Self::ProvisionComplete(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::SessionList => {
                Self::SessionList(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::ShortcutList => {
                Self::ShortcutList(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::FrameReady => {
                Self::FrameReady(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::WindowBufferAllocated => {
                Self::WindowBufferAllocated(serde_json::from_slice(bytes).map_err(map_err)?)
            },
            MessageType::Error => Self::Error(serde_json::from_slice(bytes).map_err(map_err)?),
            MessageType::Ack => Self::Ack(serde_json::from_slice(bytes).map_err(map_err)?),
            // Host-directed types are caught by the direction check before
            // we get here; reaching this arm would be a bug in the caller.
            _ => return Err(ProtocolError::UnexpectedDirection { byte: message_type.as_byte() }),
        })
    }

    /// Decode a guest-directed message from a raw envelope, enforcing the
    /// direction check and unknown-type rejection.
    pub fn from_envelope(envelope: &RawEnvelope) -> Result<Self, ProtocolError> {
        let byte = envelope.message_type;
        let message_type =
            MessageType::from_byte(byte).ok_or(ProtocolError::InvalidMessageType(byte))?;
        if message_type.direction() != crate::message_type::Direction::GuestToHost {
            return Err(ProtocolError::UnexpectedDirection { byte });
        }
        Self::decode_payload(message_type, &envelope.payload)
    }
}

/// Outcome of [`try_read_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum TryRead {
    /// Fewer than a full envelope's worth of bytes are buffered.
    Incomplete,
    /// A complete, validated guest message was read.
    Message {
        /// Bytes consumed from the front of the input.
        consumed: usize,
        /// The wire type byte.
        message_type: u8,
        /// The decoded message.
        message: GuestMessage,
    },
}

/// Incrementally read one guest-directed message from `src`.
///
/// Combines envelope framing with payload decode and the direction/type
/// checks, matching the "incremental variant" described for the wire codec:
/// it never blocks on partial input, and a decode error is returned rather
/// than panicking.
pub fn try_read_message(src: &[u8]) -> Result<TryRead, ProtocolError> {
    match crate::envelope::try_read_envelope(src) {
        crate::envelope::ReadOutcome::Incomplete => Ok(TryRead::Incomplete),
        crate::envelope::ReadOutcome::Complete { envelope, consumed } => {
            let message_type = envelope.message_type;
            let message = GuestMessage::from_envelope(&envelope)?;
            Ok(TryRead::Message { consumed, message_type, message })
        },
    }
}

/// Named error codes carried in a guest [`guest::Error`] payload.
pub mod error_code {
    /// The request payload was malformed or failed validation.
    pub const INVALID_PAYLOAD: u32 = 0x0001;
    /// The referenced window does not exist.
    pub const WINDOW_NOT_FOUND: u32 = 0x0002;
    /// The referenced session does not exist.
    pub const SESSION_NOT_FOUND: u32 = 0x0003;
    /// The referenced shortcut does not exist.
    pub const SHORTCUT_NOT_FOUND: u32 = 0x0004;
    /// An unspecified internal guest error.
    pub const INTERNAL_ERROR: u32 = 0x0005;
}
