//! Per-window stream: the central state machine.
//!
//! The state machine itself performs no I/O. It is driven by feeding it
//! [`StreamEvent`]s and executing the [`StreamAction`]s it returns; see
//! [`crate::driver`] for the async loop that does that against a real
//! [`spice_transport::Transport`].

use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use spice_proto::payloads::guest::FrameDataHeader;
use spice_proto::payloads::host::{ClipboardData, DragDropEvent, KeyboardInput, MouseInput};
use spice_proto::payloads::shared::{ClipboardFormat, PixelFormat};
use spice_proto::payloads::{GuestMessage, TryRead};
use spice_transport::{CloseReason, Subscription, TransportError};

use crate::ids::WindowId;
use crate::metrics::StreamMetrics;

/// Backoff schedule applied after a non-terminal transport close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// `delay(attempt) = min(initialDelay * multiplier^(attempt-1), maxDelay)`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lifecycle {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed { reason: CloseReason },
}

/// Caller-observable connection state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32, max_attempts: Option<u32> },
    Failed { reason: CloseReason },
}

#[derive(Debug, Clone, PartialEq)]
enum ParserState {
    Draining,
    ConsumingFramePayload {
        header: FrameDataHeader,
        remaining: usize,
        should_deliver: bool,
        collected: Vec<u8>,
    },
}

/// A frame fully reassembled from a `frameData` envelope and its inline
/// raw payload, ready for delivery to an observer.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredFrame {
    pub window_id: WindowId,
    pub frame_number: u64,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
    pub payload: Vec<u8>,
}

impl DeliveredFrame {
    fn from_header(header: FrameDataHeader, payload: Vec<u8>) -> Self {
        Self {
            window_id: WindowId(header.window_id),
            frame_number: header.frame_number,
            width: header.width,
            height: header.height,
            stride: header.stride,
            format: header.format,
            payload,
        }
    }
}

/// A clipboard change, from either the envelope protocol or a native push.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardDelivery {
    pub format: ClipboardFormat,
    pub data: Vec<u8>,
}

/// Inputs to [`Stream::handle`].
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Connect { window_id: WindowId },
    Disconnect,
    Reconnect,
    Pause,
    Resume,
    TransportOpened { subscription: Subscription },
    TransportOpenFailed { error: TransportError },
    TransportClosed { reason: CloseReason },
    BytesReceived { chunk: Bytes },
    ClipboardPushed { data: ClipboardData },
    SendMouseEvent(MouseInput),
    SendKeyboardEvent(KeyboardInput),
    SendClipboard(ClipboardData),
    RequestClipboard,
    SendDragDropEvent(DragDropEvent),
    ReconnectTimerFired { epoch: u64 },
}

/// Outputs of [`Stream::handle`], executed by the driver loop.
#[derive(Debug, Clone)]
pub enum StreamAction {
    OpenTransport,
    CloseTransport { subscription: Subscription },
    ScheduleReconnect { attempt: u32, delay: Duration, epoch: u64 },
    DeliverMetadata(spice_proto::payloads::guest::WindowMetadata),
    DeliverFrame(DeliveredFrame),
    DeliverClipboard(ClipboardDelivery),
    ForwardMouseEvent(MouseInput),
    ForwardKeyboardEvent(KeyboardInput),
    ForwardClipboard(ClipboardData),
    ForwardClipboardRequest,
    ForwardDragDropEvent(DragDropEvent),
    NotifyDisconnected { reason: Option<CloseReason> },
    /// The guest allocated (or reallocated) this window's frame buffer;
    /// the driver forwards this to the frame router.
    BufferAllocated(spice_proto::payloads::guest::WindowBufferAllocated),
    /// The guest wrote a new frame into this window's buffer; the driver
    /// forwards this to the frame router to read it out.
    FrameReady { frame_number: u64 },
}

/// The per-window stream state machine.
pub struct Stream {
    lifecycle: Lifecycle,
    subscription: Option<Subscription>,
    window_id: Option<WindowId>,
    is_user_initiated_close: bool,
    is_paused: bool,
    reconnect_attempts: u32,
    epoch: u64,
    policy: ReconnectPolicy,
    buffer: BytesMut,
    parser: ParserState,
    metrics: StreamMetrics,
}

impl Stream {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            lifecycle: Lifecycle::Disconnected,
            subscription: None,
            window_id: None,
            is_user_initiated_close: false,
            is_paused: false,
            reconnect_attempts: 0,
            epoch: 0,
            policy,
            buffer: BytesMut::new(),
            parser: ParserState::Draining,
            metrics: StreamMetrics::default(),
        }
    }

    #[must_use]
    pub fn window_id(&self) -> Option<WindowId> {
        self.window_id
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        match self.lifecycle {
            Lifecycle::Disconnected => ConnectionState::Disconnected,
            Lifecycle::Connecting => ConnectionState::Connecting,
            Lifecycle::Connected => ConnectionState::Connected,
            Lifecycle::Reconnecting { attempt } => {
                ConnectionState::Reconnecting { attempt, max_attempts: self.policy.max_attempts }
            },
            Lifecycle::Failed { reason } => ConnectionState::Failed { reason },
        }
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> StreamMetrics {
        self.metrics.clone()
    }

    /// Dispatch one event, returning the actions the driver must execute.
    pub fn handle(&mut self, event: StreamEvent) -> Vec<StreamAction> {
        match event {
            StreamEvent::Connect { window_id } => self.on_connect(window_id),
            StreamEvent::Disconnect => self.on_disconnect(),
            StreamEvent::Reconnect => self.on_reconnect(),
            StreamEvent::Pause => self.on_pause(),
            StreamEvent::Resume => self.on_resume(),
            StreamEvent::TransportOpened { subscription } => self.on_transport_opened(subscription),
            StreamEvent::TransportOpenFailed { error } => self.on_transport_open_failed(&error),
            StreamEvent::TransportClosed { reason } => self.on_transport_closed(reason),
            StreamEvent::BytesReceived { chunk } => self.on_bytes_received(&chunk),
            StreamEvent::ClipboardPushed { data } => {
                vec![StreamAction::DeliverClipboard(ClipboardDelivery { format: data.format, data: data.data })]
            },
            StreamEvent::SendMouseEvent(event) => self.forward_if_connected(StreamAction::ForwardMouseEvent(event)),
            StreamEvent::SendKeyboardEvent(event) => {
                self.forward_if_connected(StreamAction::ForwardKeyboardEvent(event))
            },
            StreamEvent::SendClipboard(data) => self.forward_if_connected(StreamAction::ForwardClipboard(data)),
            StreamEvent::RequestClipboard => self.forward_if_connected(StreamAction::ForwardClipboardRequest),
            StreamEvent::SendDragDropEvent(event) => {
                self.forward_if_connected(StreamAction::ForwardDragDropEvent(event))
            },
            StreamEvent::ReconnectTimerFired { epoch } => self.on_reconnect_timer_fired(epoch),
        }
    }

    fn forward_if_connected(&self, action: StreamAction) -> Vec<StreamAction> {
        if matches!(self.lifecycle, Lifecycle::Connected) { vec![action] } else { Vec::new() }
    }

    fn on_connect(&mut self, window_id: WindowId) -> Vec<StreamAction> {
        if !matches!(self.lifecycle, Lifecycle::Disconnected) {
            return Vec::new();
        }
        self.window_id = Some(window_id);
        self.is_user_initiated_close = false;
        self.reconnect_attempts = 0;
        self.lifecycle = Lifecycle::Connecting;
        vec![StreamAction::OpenTransport]
    }

    fn on_disconnect(&mut self) -> Vec<StreamAction> {
        self.is_user_initiated_close = true;
        self.is_paused = false;
        self.epoch += 1;
        let mut actions = Vec::new();
        if let Some(subscription) = self.subscription.take() {
            actions.push(StreamAction::CloseTransport { subscription });
        }
        self.lifecycle = Lifecycle::Disconnected;
        actions
    }

    fn on_reconnect(&mut self) -> Vec<StreamAction> {
        self.reconnect_attempts = 0;
        self.metrics.last_error_description = None;
        self.is_user_initiated_close = false;
        self.epoch += 1;
        let mut actions = Vec::new();
        if let Some(subscription) = self.subscription.take() {
            actions.push(StreamAction::CloseTransport { subscription });
        }
        self.lifecycle = Lifecycle::Connecting;
        actions.push(StreamAction::OpenTransport);
        actions
    }

    fn on_pause(&mut self) -> Vec<StreamAction> {
        self.is_paused = true;
        Vec::new()
    }

    fn on_resume(&mut self) -> Vec<StreamAction> {
        let was_paused = self.is_paused;
        self.is_paused = false;
        if was_paused && matches!(self.lifecycle, Lifecycle::Disconnected) && !self.is_user_initiated_close {
            self.epoch += 1;
            self.lifecycle = Lifecycle::Connecting;
            return vec![StreamAction::OpenTransport];
        }
        Vec::new()
    }

    fn on_transport_opened(&mut self, subscription: Subscription) -> Vec<StreamAction> {
        self.subscription = Some(subscription);
        self.lifecycle = Lifecycle::Connected;
        Vec::new()
    }

    fn on_transport_open_failed(&mut self, error: &TransportError) -> Vec<StreamAction> {
        if self.is_user_initiated_close {
            return Vec::new();
        }
        self.metrics.record_error(error.to_string());
        self.begin_reconnect_or_fail(CloseReason::TransportError)
    }

    fn on_transport_closed(&mut self, reason: CloseReason) -> Vec<StreamAction> {
        self.subscription = None;
        if self.is_user_initiated_close {
            self.lifecycle = Lifecycle::Disconnected;
            return vec![StreamAction::NotifyDisconnected { reason: None }];
        }
        if self.is_paused {
            self.lifecycle = Lifecycle::Disconnected;
            return Vec::new();
        }
        if reason.is_terminal() {
            self.lifecycle = Lifecycle::Failed { reason };
            return vec![StreamAction::NotifyDisconnected { reason: Some(reason) }];
        }
        self.begin_reconnect_or_fail(reason)
    }

    fn begin_reconnect_or_fail(&mut self, reason: CloseReason) -> Vec<StreamAction> {
        let next_attempt = self.reconnect_attempts + 1;
        if let Some(max) = self.policy.max_attempts {
            if next_attempt > max {
                self.lifecycle = Lifecycle::Failed { reason };
                return vec![StreamAction::NotifyDisconnected { reason: Some(reason) }];
            }
        }
        self.reconnect_attempts = next_attempt;
        self.metrics.reconnect_attempts += 1;
        self.epoch += 1;
        self.lifecycle = Lifecycle::Reconnecting { attempt: next_attempt };
        let delay = self.policy.delay_for_attempt(next_attempt);
        vec![StreamAction::ScheduleReconnect { attempt: next_attempt, delay, epoch: self.epoch }]
    }

    fn on_reconnect_timer_fired(&mut self, epoch: u64) -> Vec<StreamAction> {
        if epoch != self.epoch {
            return Vec::new();
        }
        if matches!(self.lifecycle, Lifecycle::Reconnecting { .. }) {
            self.lifecycle = Lifecycle::Connecting;
            vec![StreamAction::OpenTransport]
        } else {
            Vec::new()
        }
    }

    fn on_bytes_received(&mut self, chunk: &[u8]) -> Vec<StreamAction> {
        self.buffer.extend_from_slice(chunk);
        let mut actions = Vec::new();
        self.drive(&mut actions);
        if self.is_paused {
            actions.retain(|action| {
                !matches!(
                    action,
                    StreamAction::DeliverMetadata(_)
                        | StreamAction::DeliverFrame(_)
                        | StreamAction::DeliverClipboard(_)
                )
            });
        }
        actions
    }

    /// The two-state byte-stream parser: drains length-prefixed envelopes,
    /// switching into raw-payload consumption for exactly the bytes that
    /// follow a `frameData` header, and back again. Re-entrant across calls;
    /// never drops bytes belonging to the next envelope.
    fn drive(&mut self, actions: &mut Vec<StreamAction>) {
        loop {
            let pending_remaining = match &self.parser {
                ParserState::ConsumingFramePayload { remaining, .. } => Some(*remaining),
                ParserState::Draining => None,
            };

            if let Some(remaining) = pending_remaining {
                let available = self.buffer.len().min(remaining);
                if available == 0 {
                    return;
                }
                let taken = self.buffer.split_to(available);
                let ParserState::ConsumingFramePayload { should_deliver, collected, remaining, .. } =
                    &mut self.parser
                else {
                    return;
                };
                if *should_deliver {
                    collected.extend_from_slice(&taken);
                }
                *remaining -= available;
                if *remaining != 0 {
                    return;
                }
                let ParserState::ConsumingFramePayload { header, should_deliver, collected, .. } =
                    std::mem::replace(&mut self.parser, ParserState::Draining)
                else {
                    return;
                };
                if should_deliver {
                    self.metrics.frames_received += 1;
                    actions.push(StreamAction::DeliverFrame(DeliveredFrame::from_header(header, collected)));
                }
                continue;
            }

            match spice_proto::payloads::try_read_message(&self.buffer) {
                Ok(TryRead::Incomplete) => return,
                Ok(TryRead::Message { consumed, message, .. }) => {
                    self.buffer.advance(consumed);
                    self.dispatch_message(message, actions);
                },
                Err(error) => {
                    self.metrics.record_error(error.to_string());
                    self.buffer.clear();
                    return;
                },
            }
        }
    }

    fn dispatch_message(&mut self, message: GuestMessage, actions: &mut Vec<StreamAction>) {
        match message {
            GuestMessage::WindowMetadata(meta) => {
                if self.accepts_metadata(WindowId(meta.window_id)) {
                    self.metrics.metadata_updates += 1;
                    actions.push(StreamAction::DeliverMetadata(meta));
                }
            },
            GuestMessage::FrameData(header) => {
                let should_deliver = self.accepts_frame(WindowId(header.window_id));
                if header.data_length == 0 {
                    // A zero-length frame is valid and emitted directly,
                    // with no pending-payload state entered.
                    if should_deliver {
                        self.metrics.frames_received += 1;
                        actions.push(StreamAction::DeliverFrame(DeliveredFrame::from_header(header, Vec::new())));
                    }
                } else {
                    self.parser = ParserState::ConsumingFramePayload {
                        header,
                        remaining: header.data_length as usize,
                        should_deliver,
                        collected: Vec::with_capacity(header.data_length as usize),
                    };
                }
            },
            GuestMessage::ClipboardChanged(changed) => {
                actions.push(StreamAction::DeliverClipboard(ClipboardDelivery {
                    format: changed.format,
                    data: changed.data,
                }));
            },
            GuestMessage::WindowBufferAllocated(allocation) => {
                if self.accepts_frame(WindowId(allocation.window_id)) {
                    actions.push(StreamAction::BufferAllocated(allocation));
                }
            },
            GuestMessage::FrameReady(ready) => {
                if self.accepts_frame(WindowId(ready.window_id)) {
                    actions.push(StreamAction::FrameReady { frame_number: ready.frame_number });
                }
            },
            _ => {},
        }
    }

    fn accepts_metadata(&self, window_id: WindowId) -> bool {
        self.window_id.is_none_or(|bound| bound == window_id)
    }

    fn accepts_frame(&self, window_id: WindowId) -> bool {
        self.window_id == Some(window_id)
    }
}

#[cfg(test)]
mod tests {
    use spice_proto::RawEnvelope;
    use spice_proto::payloads::HostMessage;
    use spice_proto::payloads::guest::WindowMetadata;
    use spice_proto::payloads::shared::{Bounds, WindowEventKind};

    use super::*;

    fn frame_data_envelope(window_id: u32, data_length: u32) -> Bytes {
        let header = FrameDataHeader {
            window_id,
            width: 2,
            height: 2,
            stride: 8,
            format: PixelFormat::Bgra32,
            data_length,
            frame_number: 7,
            is_key_frame: true,
        };
        let payload = serde_json::to_vec(&header).expect("serializable header");
        let envelope = RawEnvelope::new(spice_proto::MessageType::FrameData.as_byte(), Bytes::from(payload));
        let mut bytes = BytesMut::new();
        envelope.encode(&mut bytes);
        bytes.freeze()
    }

    fn metadata_envelope(window_id: u32, title: &str) -> Bytes {
        let meta = WindowMetadata {
            window_id,
            title: title.to_string(),
            bounds: Bounds { x: 0, y: 0, width: 100, height: 100 },
            event_type: WindowEventKind::Created,
            is_resizable: true,
            scale_factor: 1.0,
        };
        let payload = serde_json::to_vec(&meta).expect("serializable metadata");
        let envelope = RawEnvelope::new(spice_proto::MessageType::WindowMetadata.as_byte(), Bytes::from(payload));
        let mut bytes = BytesMut::new();
        envelope.encode(&mut bytes);
        bytes.freeze()
    }

    fn connected_stream(window_id: u32) -> Stream {
        let mut stream = Stream::new(ReconnectPolicy::default());
        stream.handle(StreamEvent::Connect { window_id: WindowId(window_id) });
        stream.handle(StreamEvent::TransportOpened { subscription: Subscription::for_test(1) });
        stream
    }

    #[test]
    fn happy_frame_delivers_to_bound_window_only() {
        let mut bound_to_1 = connected_stream(1);
        let mut bound_to_2 = connected_stream(2);

        let mut chunk = frame_data_envelope(1, 16).to_vec();
        chunk.extend_from_slice(&(0..16).collect::<Vec<u8>>());

        let actions = bound_to_1.handle(StreamEvent::BytesReceived { chunk: Bytes::from(chunk.clone()) });
        assert_eq!(bound_to_1.metrics_snapshot().frames_received, 1);
        let frame = actions
            .into_iter()
            .find_map(|a| if let StreamAction::DeliverFrame(f) = a { Some(f) } else { None })
            .expect("frame delivered");
        assert_eq!(frame.payload, (0..16).collect::<Vec<u8>>());

        let actions2 = bound_to_2.handle(StreamEvent::BytesReceived { chunk: Bytes::from(chunk) });
        assert!(actions2.is_empty());
        assert_eq!(bound_to_2.metrics_snapshot().frames_received, 0);
    }

    #[test]
    fn split_envelope_across_chunks_still_emits_one_frame() {
        let mut stream = connected_stream(1);
        let mut full = frame_data_envelope(1, 16).to_vec();
        full.extend_from_slice(&(0..16).collect::<Vec<u8>>());

        let (first, second) = full.split_at(3);
        let actions1 = stream.handle(StreamEvent::BytesReceived { chunk: Bytes::copy_from_slice(first) });
        assert!(actions1.is_empty());
        let actions2 = stream.handle(StreamEvent::BytesReceived { chunk: Bytes::copy_from_slice(second) });
        assert_eq!(actions2.len(), 1);
        assert!(matches!(actions2[0], StreamAction::DeliverFrame(_)));
    }

    #[test]
    fn metadata_frame_metadata_arrive_in_order() {
        let mut stream = connected_stream(1);
        let mut chunk = metadata_envelope(1, "A").to_vec();
        chunk.extend_from_slice(&frame_data_envelope(1, 4));
        chunk.extend_from_slice(&[0, 1, 2, 3]);
        chunk.extend_from_slice(&metadata_envelope(1, "B"));

        let actions = stream.handle(StreamEvent::BytesReceived { chunk: Bytes::from(chunk) });
        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], StreamAction::DeliverMetadata(_)));
        assert!(matches!(actions[1], StreamAction::DeliverFrame(_)));
        assert!(matches!(actions[2], StreamAction::DeliverMetadata(_)));
    }

    #[test]
    fn zero_length_frame_emits_without_pending_state() {
        let mut stream = connected_stream(1);
        let chunk = frame_data_envelope(1, 0);
        let actions = stream.handle(StreamEvent::BytesReceived { chunk });
        assert_eq!(actions.len(), 1);
        let StreamAction::DeliverFrame(frame) = &actions[0] else { panic!("expected frame") };
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn parse_error_clears_buffer_and_does_not_fail_the_stream() {
        let mut stream = connected_stream(1);
        let mut garbage = vec![HostMessage::Shutdown(spice_proto::payloads::host::Shutdown { force: true })
            .into_envelope()
            .expect("encodes")
            .message_type];
        garbage.extend_from_slice(&0u32.to_le_bytes());
        let actions = stream.handle(StreamEvent::BytesReceived { chunk: Bytes::from(garbage) });
        assert!(actions.is_empty());
        assert!(stream.metrics_snapshot().last_error_description.is_some());
        assert!(matches!(stream.connection_state(), ConnectionState::Connected));
    }

    #[test]
    fn reconnect_bound_enters_failed_after_max_attempts() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(100),
            max_attempts: Some(2),
        };
        let mut stream = Stream::new(policy);
        stream.handle(StreamEvent::Connect { window_id: WindowId(1) });
        stream.handle(StreamEvent::TransportOpened { subscription: Subscription::for_test(1) });

        let actions = stream.handle(StreamEvent::TransportClosed { reason: CloseReason::TransportError });
        let StreamAction::ScheduleReconnect { attempt: 1, delay, epoch } = actions[0].clone() else {
            panic!("expected first reconnect schedule")
        };
        assert_eq!(delay, Duration::from_millis(10));

        let actions = stream.handle(StreamEvent::ReconnectTimerFired { epoch });
        assert!(matches!(actions[0], StreamAction::OpenTransport));

        let actions = stream.handle(StreamEvent::TransportOpenFailed { error: TransportError::ConnectionFailed("x".into()) });
        let StreamAction::ScheduleReconnect { attempt: 2, delay, epoch } = actions[0].clone() else {
            panic!("expected second reconnect schedule")
        };
        assert_eq!(delay, Duration::from_millis(20));

        let actions = stream.handle(StreamEvent::ReconnectTimerFired { epoch });
        assert!(matches!(actions[0], StreamAction::OpenTransport));

        let actions = stream.handle(StreamEvent::TransportOpenFailed { error: TransportError::ConnectionFailed("x".into()) });
        assert!(matches!(actions[0], StreamAction::NotifyDisconnected { reason: Some(CloseReason::TransportError) }));
        assert!(matches!(stream.connection_state(), ConnectionState::Failed { .. }));
    }

    #[test]
    fn authentication_failure_is_terminal_without_reconnect() {
        let mut stream = connected_stream(1);
        let actions = stream.handle(StreamEvent::TransportClosed { reason: CloseReason::AuthenticationFailed });
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], StreamAction::NotifyDisconnected { reason: Some(CloseReason::AuthenticationFailed) }));
        assert!(matches!(stream.connection_state(), ConnectionState::Failed { .. }));
    }

    #[test]
    fn sends_are_dropped_unless_connected() {
        let mut stream = Stream::new(ReconnectPolicy::default());
        let mouse = MouseInput { window_id: 1, x: 0, y: 0, buttons: 0, wheel_delta: 0 };
        assert!(stream.handle(StreamEvent::SendMouseEvent(mouse)).is_empty());
    }

    #[test]
    fn pause_silences_delivery_but_keeps_parser_position() {
        let mut stream = connected_stream(1);
        stream.handle(StreamEvent::Pause);
        let mut chunk = frame_data_envelope(1, 4).to_vec();
        chunk.extend_from_slice(&[1, 2, 3, 4]);
        let actions = stream.handle(StreamEvent::BytesReceived { chunk: Bytes::from(chunk) });
        assert!(actions.is_empty());
        assert_eq!(stream.metrics_snapshot().frames_received, 1);
    }

    #[test]
    fn resume_reopens_after_drop_while_paused() {
        let mut stream = connected_stream(1);
        stream.handle(StreamEvent::Pause);
        stream.handle(StreamEvent::TransportClosed { reason: CloseReason::RemoteClosed });
        assert!(matches!(stream.connection_state(), ConnectionState::Disconnected));
        let actions = stream.handle(StreamEvent::Resume);
        assert!(matches!(actions[0], StreamAction::OpenTransport));
    }

    #[test]
    fn buffer_allocation_and_frame_ready_surface_for_bound_window_only() {
        use spice_proto::payloads::guest::{FrameReady, WindowBufferAllocated};

        let allocation = WindowBufferAllocated {
            window_id: 1,
            buffer_offset: 0,
            buffer_size: 4096,
            slot_size: 256,
            slot_count: 16,
            is_compressed: false,
            uses_shared_memory: true,
            is_reallocation: false,
        };
        let ready = FrameReady { window_id: 1, frame_number: 9 };

        let envelope_for = |message_type: spice_proto::MessageType, payload: Vec<u8>| {
            let envelope = RawEnvelope::new(message_type.as_byte(), Bytes::from(payload));
            let mut bytes = BytesMut::new();
            envelope.encode(&mut bytes);
            bytes.freeze()
        };

        let mut bound_to_1 = connected_stream(1);
        let actions = bound_to_1.handle(StreamEvent::BytesReceived {
            chunk: envelope_for(
                spice_proto::MessageType::WindowBufferAllocated,
                serde_json::to_vec(&allocation).unwrap(),
            ),
        });
        assert!(matches!(actions.as_slice(), [StreamAction::BufferAllocated(a)] if a.window_id == 1));

        let actions = bound_to_1.handle(StreamEvent::BytesReceived {
            chunk: envelope_for(spice_proto::MessageType::FrameReady, serde_json::to_vec(&ready).unwrap()),
        });
        assert!(matches!(actions.as_slice(), [StreamAction::FrameReady { frame_number: 9 }]));

        let mut bound_to_2 = connected_stream(2);
        let actions = bound_to_2.handle(StreamEvent::BytesReceived {
            chunk: envelope_for(
                spice_proto::MessageType::WindowBufferAllocated,
                serde_json::to_vec(&allocation).unwrap(),
            ),
        });
        assert!(actions.is_empty());
    }
}
