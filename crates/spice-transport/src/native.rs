//! The native FFI boundary: a retained trampoline bridging guest-library
//! callback threads into the channel-based [`crate::Transport`] interface.
//!
//! The guest-side library calls back on threads it owns. Every callback here
//! does the minimum possible work — decode a length-prefixed buffer, `try_send`
//! it onto a channel — and never blocks, never allocates beyond the one
//! buffer copy, and never unwinds across the FFI boundary.

#![allow(unsafe_code)]

use std::ffi::c_void;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use spice_proto::mappers::clipboard;
use spice_proto::payloads::host::{ClipboardData, DragDropEvent, KeyboardInput, MouseInput};
use tokio::sync::{mpsc, oneshot};

use crate::config::TransportConfig;
use crate::error::{CloseReason, TransportError};
use crate::subscription::Subscription;
use crate::transport::{StreamHandles, Transport};

/// Declarations for the guest-side native library. No symbols are linked in
/// this tree; a real build supplies them via a build script and `#[link]`.
mod sys {
    use std::ffi::c_void;

    /// Opaque handle to a native guest connection.
    #[repr(C)]
    pub struct GuestHandle {
        _private: [u8; 0],
    }

    pub type FrameCallback = extern "C" fn(user_data: *mut c_void, data: *const u8, len: usize);
    pub type ClosedCallback = extern "C" fn(user_data: *mut c_void, reason: u8);
    pub type ClipboardCallback =
        extern "C" fn(user_data: *mut c_void, format: u8, data: *const u8, len: usize);

    unsafe extern "C" {
        pub fn spice_guest_connect(
            host: *const u8,
            host_len: usize,
            port: u16,
            window_id: u32,
            user_data: *mut c_void,
            on_frame: FrameCallback,
            on_clipboard: ClipboardCallback,
            on_closed: ClosedCallback,
        ) -> *mut GuestHandle;

        pub fn spice_guest_disconnect(handle: *mut GuestHandle);

        pub fn spice_guest_send(handle: *mut GuestHandle, data: *const u8, len: usize) -> bool;
    }
}

/// Per-stream state kept alive for as long as the native library may still
/// call back into us. Released only after `spice_guest_disconnect` returns,
/// so there is no window where a callback observes a dangling sender.
struct Trampoline {
    chunks: mpsc::Sender<Bytes>,
    clipboard: mpsc::Sender<ClipboardData>,
    closed: Mutex<Option<oneshot::Sender<CloseReason>>>,
}

extern "C" fn on_frame(user_data: *mut c_void, data: *const u8, len: usize) {
    // Safety: `user_data` is an `Arc<Trampoline>` pointer created in
    // `open_stream` and kept alive until after disconnect; `data`/`len`
    // describe a buffer valid only for the duration of this call.
    let trampoline = unsafe { &*user_data.cast::<Trampoline>() };
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    if trampoline.chunks.try_send(Bytes::copy_from_slice(bytes)).is_err() {
        tracing::warn!("dropped native frame chunk, receiver full or gone");
    }
}

extern "C" fn on_clipboard(user_data: *mut c_void, format: u8, data: *const u8, len: usize) {
    let trampoline = unsafe { &*user_data.cast::<Trampoline>() };
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    let Some(native_format) = decode_native_clipboard_format(format) else {
        tracing::warn!(format, "unknown native clipboard format byte");
        return;
    };
    let wire_format = clipboard::native_to_wire(native_format);
    let message = ClipboardData { format: wire_format, data: bytes.to_vec() };
    if trampoline.clipboard.try_send(message).is_err() {
        tracing::warn!("dropped native clipboard push, receiver full or gone");
    }
}

extern "C" fn on_closed(user_data: *mut c_void, reason: u8) {
    let trampoline = unsafe { &*user_data.cast::<Trampoline>() };
    let reason = decode_close_reason(reason);
    if let Some(sender) = trampoline.closed.lock().unwrap_or_else(|e| e.into_inner()).take() {
        let _ = sender.send(reason);
    }
}

fn decode_native_clipboard_format(byte: u8) -> Option<clipboard::NativeClipboardFormat> {
    match byte {
        0 => Some(clipboard::NativeClipboardFormat::Utf8Text),
        1 => Some(clipboard::NativeClipboardFormat::Bmp),
        2 => Some(clipboard::NativeClipboardFormat::Png),
        _ => None,
    }
}

fn decode_close_reason(byte: u8) -> CloseReason {
    match byte {
        1 => CloseReason::TransportError,
        2 => CloseReason::AuthenticationFailed,
        3 => CloseReason::SharedMemoryUnavailable,
        _ => CloseReason::RemoteClosed,
    }
}

/// A [`Transport`] backed by the guest-side native library.
pub struct NativeTransport {
    handle: Option<*mut sys::GuestHandle>,
    /// Kept alive until `close_stream` runs `spice_guest_disconnect`, so the
    /// trampoline's raw pointer stays valid for every callback the native
    /// side might still invoke.
    trampoline: Option<Arc<Trampoline>>,
    control_sink: Option<mpsc::Sender<Bytes>>,
}

// Safety: `NativeTransport` only exposes the raw handle through the
// `Transport` methods, all of which take `&mut self`; the native library's
// own contract guarantees a handle may be driven from any single thread.
unsafe impl Send for NativeTransport {}

impl Default for NativeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self { handle: None, trampoline: None, control_sink: None }
    }
}

impl Transport for NativeTransport {
    async fn open_stream(
        &mut self,
        config: &TransportConfig,
        window_id: u32,
    ) -> Result<(Subscription, StreamHandles), TransportError> {
        let TransportConfig::Tcp { host, port, .. } = config else {
            return Err(TransportError::ConnectionFailed(
                "native transport requires a TCP endpoint".to_string(),
            ));
        };

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (clipboard_tx, clipboard_rx) = mpsc::channel(8);
        let (closed_tx, closed_rx) = oneshot::channel();

        let trampoline =
            Arc::new(Trampoline { chunks: chunk_tx, clipboard: clipboard_tx, closed: Mutex::new(Some(closed_tx)) });
        let user_data = Arc::as_ptr(&trampoline).cast::<c_void>().cast_mut();

        // Safety: `host` stays borrowed for the duration of this call;
        // `trampoline` is kept alive in `self.trampoline` past this point, so
        // `user_data` stays valid for every future callback until
        // `close_stream` disconnects.
        let raw_handle = unsafe {
            sys::spice_guest_connect(
                host.as_ptr(),
                host.len(),
                *port,
                window_id,
                user_data,
                on_frame,
                on_clipboard,
                on_closed,
            )
        };

        if raw_handle.is_null() {
            return Err(TransportError::ConnectionFailed(format!("connect to {host}:{port} failed")));
        }

        self.handle = Some(raw_handle);
        self.trampoline = Some(trampoline);

        Ok((Subscription::new(u64::from(window_id)), StreamHandles { chunks: chunk_rx, clipboard: clipboard_rx, closed: closed_rx }))
    }

    async fn close_stream(&mut self, subscription: &Subscription) {
        if !subscription.mark_closed() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            // Safety: `handle` was returned by a successful `spice_guest_connect`
            // and has not been disconnected yet.
            unsafe { sys::spice_guest_disconnect(handle) };
        }
        self.trampoline = None;
    }

    async fn send_mouse_event(
        &mut self,
        _subscription: &Subscription,
        event: MouseInput,
    ) -> Result<(), TransportError> {
        self.send_json(&event)
    }

    async fn send_keyboard_event(
        &mut self,
        _subscription: &Subscription,
        event: KeyboardInput,
    ) -> Result<(), TransportError> {
        self.send_json(&event)
    }

    async fn send_clipboard(
        &mut self,
        _subscription: &Subscription,
        data: ClipboardData,
    ) -> Result<(), TransportError> {
        self.send_json(&data)
    }

    async fn request_clipboard(&mut self, _subscription: &Subscription) -> Result<(), TransportError> {
        self.send_json(&())
    }

    async fn send_drag_drop_event(
        &mut self,
        _subscription: &Subscription,
        event: DragDropEvent,
    ) -> Result<(), TransportError> {
        self.send_json(&event)
    }

    fn set_control_callback(&mut self, sink: mpsc::Sender<Bytes>) {
        self.control_sink = Some(sink);
    }

    async fn send_control_message(&mut self, bytes: Bytes) -> bool {
        self.send_raw(&bytes).is_ok()
    }
}

impl NativeTransport {
    fn send_json<T: serde::Serialize>(&self, value: &T) -> Result<(), TransportError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|error| TransportError::ConnectionFailed(error.to_string()))?;
        self.send_raw(&bytes)
    }

    fn send_raw(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let Some(handle) = self.handle else {
            return Err(TransportError::ConnectionFailed("no open native connection".to_string()));
        };
        // Safety: `handle` is only ever `Some` while still connected.
        let sent = unsafe { sys::spice_guest_send(handle, bytes.as_ptr(), bytes.len()) };
        if sent {
            Ok(())
        } else {
            Err(TransportError::ConnectionFailed("native send rejected".to_string()))
        }
    }
}
