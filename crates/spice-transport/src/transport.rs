//! The transport abstraction.

use std::future::Future;

use bytes::Bytes;
use spice_proto::payloads::host::{ClipboardData, DragDropEvent, KeyboardInput, MouseInput};
use tokio::sync::{mpsc, oneshot};

use crate::config::TransportConfig;
use crate::error::{CloseReason, TransportError};
use crate::subscription::Subscription;

/// Channels handed back from a successful `open_stream`.
///
/// `chunks` carries the raw envelope/frame-payload byte stream the
/// per-window stream state machine parses (see the control-byte parser in
/// `spice-core`); `clipboard` carries guest clipboard pushes decoded at the
/// transport boundary; `closed` resolves exactly once, with the reason the
/// connection ended.
pub struct StreamHandles {
    pub chunks: mpsc::Receiver<Bytes>,
    pub clipboard: mpsc::Receiver<ClipboardData>,
    pub closed: oneshot::Receiver<CloseReason>,
}

/// Opens and drives a single Spice connection: video/metadata stream, input
/// forwarding, clipboard, and the control byte-stream.
///
/// Implementations hand off any native callback-thread delivery to a
/// bounded, ordered channel before returning from `open_stream` — callers
/// never observe a callback on a thread they don't own.
pub trait Transport: Send {
    /// Open a stream for `window_id` using `config`. On success, returns a
    /// scoped [`Subscription`] and the channels that will carry this
    /// stream's events until it is closed.
    fn open_stream(
        &mut self,
        config: &TransportConfig,
        window_id: u32,
    ) -> impl Future<Output = Result<(Subscription, StreamHandles), TransportError>> + Send;

    /// Close a previously opened stream. Safe to call more than once; only
    /// the first call has an effect (see [`Subscription::mark_closed`]).
    fn close_stream(&mut self, subscription: &Subscription) -> impl Future<Output = ()> + Send;

    fn send_mouse_event(
        &mut self,
        subscription: &Subscription,
        event: MouseInput,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_keyboard_event(
        &mut self,
        subscription: &Subscription,
        event: KeyboardInput,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_clipboard(
        &mut self,
        subscription: &Subscription,
        data: ClipboardData,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn request_clipboard(
        &mut self,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_drag_drop_event(
        &mut self,
        subscription: &Subscription,
        event: DragDropEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Register the sink that receives inbound control-channel byte chunks
    /// (the control channel shares this transport but uses a dedicated
    /// logical stream, window identifier zero).
    fn set_control_callback(&mut self, sink: mpsc::Sender<Bytes>);

    /// Send a raw control-channel message. Returns `false` if the transport
    /// has no open connection to send it over.
    fn send_control_message(&mut self, bytes: Bytes) -> impl Future<Output = bool> + Send;
}
