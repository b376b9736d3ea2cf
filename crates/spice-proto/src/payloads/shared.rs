//! Payload fragments shared by more than one message type.

use serde::{Deserialize, Serialize};

/// Window bounds in host logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge, in host logical pixels.
    pub x: i32,
    /// Top edge, in host logical pixels.
    pub y: i32,
    /// Width, in host logical pixels.
    pub width: u32,
    /// Height, in host logical pixels.
    pub height: u32,
}

/// The kind of window lifecycle event carried by `windowMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowEventKind {
    /// The window was created.
    Created,
    /// The window moved.
    Moved,
    /// The window was resized.
    Resized,
    /// The window gained or lost focus.
    FocusChanged,
    /// The window was closed.
    Closed,
}

/// Pixel formats used by frame data and clipboard images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 32-bit BGRA, 8 bits per channel.
    Bgra32,
    /// 32-bit RGBA, 8 bits per channel.
    Rgba32,
    /// 24-bit RGB, 8 bits per channel, no alpha.
    Rgb24,
}

/// Clipboard content format tags carried over the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardFormat {
    /// Plain UTF-8 text.
    Text,
    /// Rich Text Format.
    Rtf,
    /// HTML fragment.
    Html,
    /// A list of `file://` URLs.
    FileUrl,
    /// Windows bitmap image.
    Bmp,
    /// PNG image.
    Png,
    /// TIFF image.
    Tiff,
}

/// A single entry in a `sessionList` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Guest-assigned session identifier.
    pub id: String,
    /// Process id of the session's owning process.
    pub pid: u32,
    /// Path to the session's executable.
    pub exe: String,
    /// Session window title, if any.
    pub title: Option<String>,
    /// Session start time, as a guest-defined timestamp.
    pub start: u64,
    /// Time of the session's last activity, as a guest-defined timestamp.
    pub last_activity: u64,
    /// Guest-reported session state (e.g. `"active"`, `"idle"`).
    pub state: String,
    /// Number of windows currently open in the session.
    pub window_count: u32,
}

/// A single entry in a `shortcutList` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutInfo {
    /// Display name of the shortcut.
    pub name: String,
    /// Path the shortcut launches.
    pub target_path: String,
    /// Path to the shortcut's icon, if any.
    pub icon_path: Option<String>,
}
