//! Message-type taxonomy: the single byte preceding every envelope payload.
//!
//! Bytes `0x00..=0x7F` are host-to-guest; `0x80..=0xFF` are guest-to-host.
//! Values outside the table are a protocol error on decode.

/// Direction a message type flows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to guest.
    HostToGuest,
    /// Guest to host.
    GuestToHost,
}

/// A recognized message type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    LaunchProgram = 0x01,
    RequestIcon = 0x02,
    ClipboardData = 0x03,
    MouseInput = 0x04,
    KeyboardInput = 0x05,
    DragDropEvent = 0x06,
    ListSessions = 0x08,
    CloseSession = 0x09,
    ListShortcuts = 0x0A,
    Shutdown = 0x0F,
    WindowMetadata = 0x80,
    FrameData = 0x81,
    CapabilityFlags = 0x82,
    DpiInfo = 0x83,
    IconData = 0x84,
    ShortcutDetected = 0x85,
    ClipboardChanged = 0x86,
    Heartbeat = 0x87,
    TelemetryReport = 0x88,
    ProvisionProgress = 0x89,
    ProvisionError = 0x8A,
    ProvisionComplete = 0x8B,
    SessionList = 0x8C,
    ShortcutList = 0x8D,
    FrameReady = 0x8E,
    WindowBufferAllocated = 0x8F,
    Error = 0xFE,
    Ack = 0xFF,
}

impl MessageType {
    /// Look up a message type by its wire byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Self::LaunchProgram,
            0x02 => Self::RequestIcon,
            0x03 => Self::ClipboardData,
            0x04 => Self::MouseInput,
            0x05 => Self::KeyboardInput,
            0x06 => Self::DragDropEvent,
            0x08 => Self::ListSessions,
            0x09 => Self::CloseSession,
            0x0A => Self::ListShortcuts,
            0x0F => Self::Shutdown,
            0x80 => Self::WindowMetadata,
            0x81 => Self::FrameData,
            0x82 => Self::CapabilityFlags,
            0x83 => Self::DpiInfo,
            0x84 => Self::IconData,
            0x85 => Self::ShortcutDetected,
            0x86 => Self::ClipboardChanged,
            0x87 => Self::Heartbeat,
            0x88 => Self::TelemetryReport,
            0x89 => Self::ProvisionProgress,
            0x8A => Self::ProvisionError,
            0x8B => Self::ProvisionComplete,
            0x8C => Self::SessionList,
            0x8D => Self::ShortcutList,
            0x8E => Self::FrameReady,
            0x8F => Self::WindowBufferAllocated,
            0xFE => Self::Error,
            0xFF => Self::Ack,
            _ => return None,
        })
    }

    /// The wire byte for this message type.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Direction this message type flows in, derived from the byte's range.
    #[must_use]
    pub fn direction(self) -> Direction {
        if self.as_byte() <= 0x7F { Direction::HostToGuest } else { Direction::GuestToHost }
    }
}

/// Direction implied purely by a raw byte's range, without requiring the byte
/// to be a recognized message type. Used by the direction check before the
/// type table lookup.
#[must_use]
pub fn direction_of_byte(byte: u8) -> Direction {
    if byte <= 0x7F { Direction::HostToGuest } else { Direction::GuestToHost }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_byte() {
        let bytes = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x08, 0x09, 0x0A, 0x0F, 0x80, 0x81, 0x82, 0x83,
            0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, 0xFE, 0xFF,
        ];
        for byte in bytes {
            let ty = MessageType::from_byte(byte).expect("known byte");
            assert_eq!(ty.as_byte(), byte);
        }
    }

    #[test]
    fn unknown_bytes_reject() {
        assert!(MessageType::from_byte(0x07).is_none());
        assert!(MessageType::from_byte(0x90).is_none());
    }

    #[test]
    fn direction_matches_range() {
        assert_eq!(MessageType::LaunchProgram.direction(), Direction::HostToGuest);
        assert_eq!(MessageType::FrameData.direction(), Direction::GuestToHost);
        assert_eq!(direction_of_byte(0x7F), Direction::HostToGuest);
        assert_eq!(direction_of_byte(0x80), Direction::GuestToHost);
    }
}
