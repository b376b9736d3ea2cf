//! Host-to-guest payloads (message-type bytes `0x00..=0x7F`).

use serde::{Deserialize, Serialize};

use super::shared::ClipboardFormat;

/// Ask the guest to launch a program inside the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchProgram {
    /// Executable path, resolved by the guest.
    pub path: String,
    /// Command-line arguments, passed through verbatim.
    pub args: Vec<String>,
}

/// Ask the guest to extract and send back an executable's icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIcon {
    /// Executable path to extract the icon from.
    pub path: String,
}

/// Push clipboard content from host to guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardData {
    /// Format of `data`.
    pub format: ClipboardFormat,
    /// Raw clipboard bytes in `format`.
    pub data: Vec<u8>,
}

/// A mouse event to inject into a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseInput {
    /// Window the event targets.
    pub window_id: u32,
    /// X position in window-local pixels.
    pub x: i32,
    /// Y position in window-local pixels.
    pub y: i32,
    /// Bitmask of currently pressed mouse buttons.
    pub buttons: u8,
    /// Vertical scroll delta; zero when the event carries no wheel motion.
    pub wheel_delta: i32,
}

/// A keyboard event to inject into a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardInput {
    /// Window the event targets.
    pub window_id: u32,
    /// Platform-native virtual key code.
    pub key_code: u32,
    /// Bitmask of currently held modifier keys.
    pub modifiers: u8,
    /// `true` for a key-down event, `false` for key-up.
    pub is_key_down: bool,
}

/// Stage of a drag-and-drop gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragDropOp {
    /// The drag entered the window's bounds.
    Enter,
    /// The drag is hovering within the window's bounds.
    Over,
    /// The payload was dropped.
    Drop,
    /// The drag left the window's bounds without dropping.
    Leave,
}

/// A drag-and-drop event to inject into a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragDropEvent {
    /// Window the event targets.
    pub window_id: u32,
    /// Which stage of the gesture this event reports.
    pub operation: DragDropOp,
    /// X position in window-local pixels.
    pub x: i32,
    /// Y position in window-local pixels.
    pub y: i32,
    /// Filesystem paths carried by the drop, empty for non-drop stages.
    pub paths: Vec<String>,
}

/// Request the guest's current list of live sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessions {
    /// Correlates the eventual `sessionList` response to this request.
    pub message_id: u32,
}

/// Ask the guest to terminate a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSession {
    /// Correlates the eventual response to this request.
    pub message_id: u32,
    /// Identifier of the session to close.
    pub session_id: String,
}

/// Request the guest's current list of configured shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShortcuts {
    /// Correlates the eventual `shortcutList` response to this request.
    pub message_id: u32,
}

/// Ask the guest to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shutdown {
    /// Skip graceful session teardown and shut down immediately.
    pub force: bool,
}
