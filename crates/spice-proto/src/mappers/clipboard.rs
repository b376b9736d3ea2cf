//! Clipboard-format translation between the protocol's format tag and the
//! host's native clipboard tag, with the specified lossy fallbacks.

use crate::payloads::shared::ClipboardFormat;

/// The host's native clipboard pasteboard types, as a closed set relevant to
/// this translation (the real pasteboard supports far more; anything not
/// listed here is simply not forwarded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeClipboardFormat {
    Utf8Text,
    Bmp,
    Png,
}

/// Translate a native (host) clipboard format to the protocol's wire format.
///
/// Lossy fallbacks: the native side only ever produces UTF-8 text, BMP, or
/// PNG in this mapping; richer formats like RTF/HTML/file URLs are guest→host
/// inbound concepts collapsed on receipt (see [`wire_to_native`]).
#[must_use]
pub fn native_to_wire(native: NativeClipboardFormat) -> ClipboardFormat {
    match native {
        NativeClipboardFormat::Utf8Text => ClipboardFormat::Text,
        NativeClipboardFormat::Bmp => ClipboardFormat::Bmp,
        NativeClipboardFormat::Png => ClipboardFormat::Png,
    }
}

/// Translate a wire clipboard format into what the host clipboard actually
/// stores, applying the specified lossy fallbacks:
///
/// - RTF, HTML, and file-URL payloads collapse to UTF-8 text.
/// - TIFF collapses to BMP.
/// - BMP received from the guest becomes PNG on the host side.
#[must_use]
pub fn wire_to_native(wire: ClipboardFormat) -> NativeClipboardFormat {
    match wire {
        ClipboardFormat::Text | ClipboardFormat::Rtf | ClipboardFormat::Html | ClipboardFormat::FileUrl => {
            NativeClipboardFormat::Utf8Text
        },
        ClipboardFormat::Tiff => NativeClipboardFormat::Bmp,
        ClipboardFormat::Bmp => NativeClipboardFormat::Png,
        ClipboardFormat::Png => NativeClipboardFormat::Png,
    }
}
