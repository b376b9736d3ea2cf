//! A synthetic, timer-driven transport used by tests and non-host platforms.
//!
//! Plays back a scripted sequence of byte chunks (and an optional close
//! reason) on a timer, so the property tests and seed scenarios in
//! `spice-core` can exercise the per-window stream parser and reconnect
//! policy without a real network or native library.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use spice_proto::payloads::host::{ClipboardData, DragDropEvent, KeyboardInput, MouseInput};
use tokio::sync::{mpsc, oneshot};

use crate::config::TransportConfig;
use crate::error::{CloseReason, TransportError};
use crate::subscription::Subscription;
use crate::transport::{StreamHandles, Transport};

/// One scripted chunk: wait `delay`, then deliver `bytes` on the stream.
#[derive(Debug, Clone)]
pub struct ScriptedChunk {
    /// How long to wait, from stream open, before delivering this chunk.
    pub delay: Duration,
    /// The bytes delivered on the stream's `chunks` channel.
    pub bytes: Bytes,
}

/// A full scripted session for one `open_stream` call.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    /// Chunks delivered in order, each after its own delay.
    pub chunks: Vec<ScriptedChunk>,
    /// If set, the `closed` signal fires with this reason once every chunk
    /// has been delivered.
    pub close_after: Option<CloseReason>,
    /// If set, `open_stream` itself fails with this error instead of
    /// succeeding — used to script transport-error/auth-failure scenarios.
    pub open_error: Option<TransportError>,
}

/// Calls the mock recorded for later assertion in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordedCalls {
    /// Mouse events passed to `send_mouse_event`, in call order.
    pub mouse_events: Vec<MouseInput>,
    /// Keyboard events passed to `send_keyboard_event`, in call order.
    pub keyboard_events: Vec<KeyboardInput>,
    /// Clipboard payloads passed to `send_clipboard`, in call order.
    pub clipboard_sent: Vec<ClipboardData>,
    /// Number of `request_clipboard` calls observed.
    pub clipboard_requests: u32,
    /// Drag-and-drop events passed to `send_drag_drop_event`, in call order.
    pub drag_drop_events: Vec<DragDropEvent>,
    /// Raw control-channel messages passed to `send_control_message`.
    pub control_messages_sent: Vec<Bytes>,
}

pub struct MockTransport {
    next_id: u64,
    script: MockScript,
    recorded: Arc<Mutex<RecordedCalls>>,
    control_sink: Option<mpsc::Sender<Bytes>>,
}

impl MockTransport {
    #[must_use]
    pub fn new(script: MockScript) -> Self {
        Self { next_id: 1, script, recorded: Arc::new(Mutex::new(RecordedCalls::default())), control_sink: None }
    }

    #[must_use]
    pub fn recorded(&self) -> Arc<Mutex<RecordedCalls>> {
        Arc::clone(&self.recorded)
    }
}

impl Transport for MockTransport {
    async fn open_stream(
        &mut self,
        _config: &TransportConfig,
        _window_id: u32,
    ) -> Result<(Subscription, StreamHandles), TransportError> {
        if let Some(error) = self.script.open_error.clone() {
            return Err(error);
        }

        let id = self.next_id;
        self.next_id += 1;
        let subscription = Subscription::new(id);

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (clipboard_tx, clipboard_rx) = mpsc::channel(8);
        let (closed_tx, closed_rx) = oneshot::channel();

        let chunks = self.script.chunks.clone();
        let close_after = self.script.close_after;

        tokio::spawn(async move {
            for chunk in chunks {
                if !chunk.delay.is_zero() {
                    tokio::time::sleep(chunk.delay).await;
                }
                if chunk_tx.send(chunk.bytes).await.is_err() {
                    return;
                }
            }
            if let Some(reason) = close_after {
                let _ = closed_tx.send(reason);
            }
            drop(clipboard_tx);
        });

        Ok((subscription, StreamHandles { chunks: chunk_rx, clipboard: clipboard_rx, closed: closed_rx }))
    }

    async fn close_stream(&mut self, subscription: &Subscription) {
        subscription.mark_closed();
    }

    async fn send_mouse_event(
        &mut self,
        _subscription: &Subscription,
        event: MouseInput,
    ) -> Result<(), TransportError> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).mouse_events.push(event);
        Ok(())
    }

    async fn send_keyboard_event(
        &mut self,
        _subscription: &Subscription,
        event: KeyboardInput,
    ) -> Result<(), TransportError> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).keyboard_events.push(event);
        Ok(())
    }

    async fn send_clipboard(
        &mut self,
        _subscription: &Subscription,
        data: ClipboardData,
    ) -> Result<(), TransportError> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).clipboard_sent.push(data);
        Ok(())
    }

    async fn request_clipboard(&mut self, _subscription: &Subscription) -> Result<(), TransportError> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).clipboard_requests += 1;
        Ok(())
    }

    async fn send_drag_drop_event(
        &mut self,
        _subscription: &Subscription,
        event: DragDropEvent,
    ) -> Result<(), TransportError> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).drag_drop_events.push(event);
        Ok(())
    }

    fn set_control_callback(&mut self, sink: mpsc::Sender<Bytes>) {
        self.control_sink = Some(sink);
    }

    async fn send_control_message(&mut self, bytes: Bytes) -> bool {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner()).control_messages_sent.push(bytes);
        true
    }
}
