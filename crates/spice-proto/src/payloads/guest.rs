//! Guest-to-host payloads (message-type bytes `0x80..=0xFF`).

use serde::{Deserialize, Serialize};

use super::shared::{Bounds, ClipboardFormat, PixelFormat, SessionInfo, ShortcutInfo, WindowEventKind};

/// A window lifecycle notification (created, moved, resized, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetadata {
    /// Window this notification describes.
    pub window_id: u32,
    /// Window title at the time of the event.
    pub title: String,
    /// Window bounds at the time of the event.
    pub bounds: Bounds,
    /// Which lifecycle event this notification reports.
    pub event_type: WindowEventKind,
    /// Whether the window can currently be resized.
    pub is_resizable: bool,
    /// Guest-side DPI scale factor to apply to `bounds`.
    pub scale_factor: f64,
}

/// The JSON header preceding a `frameData` message's raw pixel bytes.
///
/// Exactly `data_length` raw bytes follow this envelope in the byte stream;
/// they are not themselves wrapped in another envelope. Handling that is the
/// responsibility of the per-window stream parser, not this codec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDataHeader {
    /// Window this frame belongs to.
    pub window_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub stride: u32,
    /// Pixel format of the raw bytes that follow.
    pub format: PixelFormat,
    /// Length in bytes of the raw payload following this header.
    pub data_length: u32,
    /// Monotonically increasing per-window frame counter.
    pub frame_number: u64,
    /// Whether this frame is independently decodable.
    pub is_key_frame: bool,
}

/// Guest-reported feature capability bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFlags {
    /// Bitmask of supported guest capabilities.
    pub flags: u32,
}

/// DPI information for a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DpiInfo {
    /// Window this DPI information describes.
    pub window_id: u32,
    /// Horizontal dots-per-inch.
    pub dpi_x: f64,
    /// Vertical dots-per-inch.
    pub dpi_y: f64,
}

/// Icon pixel data in response to a `requestIcon` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconData {
    /// Executable path the icon was extracted from.
    pub path: String,
    /// Pixel format of `pixels`.
    pub format: PixelFormat,
    /// Icon width in pixels.
    pub width: u32,
    /// Icon height in pixels.
    pub height: u32,
    /// Raw pixel bytes in `format`.
    pub pixels: Vec<u8>,
}

/// A configured shortcut the guest detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetected {
    /// The detected shortcut.
    pub shortcut: ShortcutInfo,
}

/// Guest clipboard content changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardChanged {
    /// Format of `data`.
    pub format: ClipboardFormat,
    /// Raw clipboard bytes in `format`.
    pub data: Vec<u8>,
}

/// Periodic liveness signal from the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    /// Monotonically increasing heartbeat counter.
    pub sequence: u64,
}

/// A guest-collected telemetry metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReport {
    /// Metric name.
    pub metric: String,
    /// Metric value.
    pub value: f64,
}

/// Progress update for a long-running guest provisioning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionProgress {
    /// Name of the provisioning phase currently running.
    pub phase: String,
    /// Completion percentage of the current phase, `0..=100`.
    pub percent: u8,
}

/// A provisioning step failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionError {
    /// Name of the provisioning phase that failed.
    pub phase: String,
    /// Human-readable failure description.
    pub message: String,
}

/// Provisioning finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionComplete {
    /// Total time provisioning took, in milliseconds.
    pub elapsed_ms: u64,
}

/// Response to a `listSessions` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionList {
    /// `messageId` of the request this responds to.
    pub message_id: u32,
    /// The guest's current sessions.
    pub sessions: Vec<SessionInfo>,
}

/// Response to a `listShortcuts` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutList {
    /// `messageId` of the request this responds to.
    pub message_id: u32,
    /// The guest's currently configured shortcuts.
    pub shortcuts: Vec<ShortcutInfo>,
}

/// Notifies the host that a new frame is available to read from shared
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReady {
    /// Window the frame belongs to.
    pub window_id: u32,
    /// Frame counter matching the slot's `FrameDataHeader::frame_number`.
    pub frame_number: u64,
}

/// Describes or re-describes a window's shared-memory frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowBufferAllocated {
    /// Window this buffer serves.
    pub window_id: u32,
    /// Byte offset of the buffer within the shared-memory region.
    pub buffer_offset: u64,
    /// Total size in bytes of the buffer at `buffer_offset`.
    pub buffer_size: u32,
    /// Size in bytes of each slot within the buffer.
    pub slot_size: u32,
    /// Number of slots within the buffer.
    pub slot_count: u32,
    /// Whether slot contents are compressed.
    pub is_compressed: bool,
    /// Whether this buffer is backed by shared memory at all.
    pub uses_shared_memory: bool,
    /// Whether this allocation replaces a previous one for the same window.
    pub is_reallocation: bool,
}

/// A guest-reported error, optionally correlated to a prior request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// `messageId` of the request this error responds to, if any.
    pub message_id: Option<u32>,
    /// Guest-defined error code.
    pub code: u32,
    /// Human-readable error description.
    pub message: String,
}

/// Generic acknowledgement of a prior request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    /// `messageId` of the request this acknowledges.
    pub message_id: u32,
}
