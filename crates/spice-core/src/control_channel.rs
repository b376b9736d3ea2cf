//! The control channel: request/response traffic bound to window id 0.
//!
//! Unlike [`crate::stream::Stream`] and [`crate::router::FrameRouter`], this
//! is not a pure `handle(event) -> actions` state machine. A request needs
//! to wait for a matching guest response or time out, and several requests
//! may be outstanding at once, so a small actor task owns the transport and
//! a table of pending responders; [`ControlChannel`] itself is a cheap,
//! cloneable handle to that task.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use spice_proto::payloads::guest::{Ack, Error as GuestError};
use spice_proto::payloads::host::{CloseSession, ListSessions, ListShortcuts};
use spice_proto::payloads::shared::{SessionInfo, ShortcutInfo};
use spice_proto::payloads::{GuestMessage, HostMessage, TryRead};
use spice_transport::Transport;
use tokio::sync::{mpsc, oneshot};

use crate::error::ControlError;
use crate::ids::MessageId;

const COMMAND_CAPACITY: usize = 32;
const INBOX_CAPACITY: usize = 64;

type Responder = oneshot::Sender<Result<GuestMessage, ControlError>>;

struct SendCommand {
    message: HostMessage,
    message_id: MessageId,
    respond_to: Responder,
}

enum ActorCommand {
    Send(SendCommand),
    Cancel(MessageId),
}

/// A cheap, cloneable handle to the control-channel actor task.
#[derive(Clone)]
pub struct ControlChannel {
    commands: mpsc::Sender<ActorCommand>,
    connected: Arc<AtomicBool>,
    next_message_id: Arc<AtomicU32>,
    timeout: Duration,
}

impl ControlChannel {
    /// Spawn the actor owning `transport`, and return a handle to it.
    ///
    /// `unsolicited` receives every guest message that does not resolve a
    /// pending request — a response whose `messageId` matches nothing
    /// outstanding (already timed out, or never sent by this process) as
    /// well as any guest message type that carries no `messageId` at all.
    /// The actor never blocks on this channel: a full or dropped receiver
    /// only means those messages are dropped, not that requests stop
    /// resolving.
    pub fn spawn<T>(mut transport: T, timeout: Duration, unsolicited: mpsc::Sender<GuestMessage>) -> Self
    where
        T: Transport + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        transport.set_control_callback(inbox_tx);

        tokio::spawn(run_actor(transport, command_rx, inbox_rx, unsolicited));

        Self {
            commands: command_tx,
            connected: Arc::new(AtomicBool::new(false)),
            next_message_id: Arc::new(AtomicU32::new(1)),
            timeout,
        }
    }

    /// Tell the channel whether its underlying connection is currently up.
    /// Requests attempted while disconnected fail immediately with
    /// [`ControlError::NotConnected`] rather than waiting out the timeout.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ControlError> {
        let message_id = self.allocate_message_id();
        let message = HostMessage::ListSessions(ListSessions { message_id: message_id.0 });
        match self.send_and_wait(message, message_id).await? {
            GuestMessage::SessionList(list) => Ok(list.sessions),
            other => Err(unexpected(other)),
        }
    }

    pub async fn close_session(&self, session_id: String) -> Result<(), ControlError> {
        let message_id = self.allocate_message_id();
        let message = HostMessage::CloseSession(CloseSession { message_id: message_id.0, session_id });
        match self.send_and_wait(message, message_id).await? {
            GuestMessage::Ack(Ack { .. }) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_shortcuts(&self) -> Result<Vec<ShortcutInfo>, ControlError> {
        let message_id = self.allocate_message_id();
        let message = HostMessage::ListShortcuts(ListShortcuts { message_id: message_id.0 });
        match self.send_and_wait(message, message_id).await? {
            GuestMessage::ShortcutList(list) => Ok(list.shortcuts),
            other => Err(unexpected(other)),
        }
    }

    fn allocate_message_id(&self) -> MessageId {
        let id = match self.next_message_id.fetch_add(1, Ordering::Relaxed) {
            0 => self.next_message_id.fetch_add(1, Ordering::Relaxed),
            id => id,
        };
        MessageId(id)
    }

    /// Send `message`, then wait for the actor to resolve a matching
    /// response or for `timeout` to elapse, whichever comes first. On
    /// timeout, tells the actor to drop its pending entry so a late
    /// response for an abandoned request isn't held forever.
    async fn send_and_wait(&self, message: HostMessage, message_id: MessageId) -> Result<GuestMessage, ControlError> {
        if !self.is_connected() {
            return Err(ControlError::NotConnected);
        }

        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(ActorCommand::Send(SendCommand { message, message_id, respond_to }))
            .await
            .map_err(|_| ControlError::SendFailed("control channel actor is no longer running".to_owned()))?;

        match tokio::time::timeout(self.timeout, response).await {
            Ok(result) => result.unwrap_or_else(|_| {
                Err(ControlError::SendFailed("control channel actor dropped the request".to_owned()))
            }),
            Err(_elapsed) => {
                let _ = self.commands.send(ActorCommand::Cancel(message_id)).await;
                Err(ControlError::Timeout)
            },
        }
    }
}

/// Owns the transport exclusively: sends outbound requests, decodes inbound
/// bytes, and resolves pending responders by matching `messageId`.
async fn run_actor<T: Transport>(
    mut transport: T,
    mut commands: mpsc::Receiver<ActorCommand>,
    mut inbox: mpsc::Receiver<Bytes>,
    unsolicited: mpsc::Sender<GuestMessage>,
) {
    let mut buffer = BytesMut::new();
    let mut pending: HashMap<MessageId, Responder> = HashMap::new();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    ActorCommand::Send(send) => handle_send(&mut transport, &mut pending, send).await,
                    ActorCommand::Cancel(message_id) => {
                        pending.remove(&message_id);
                    },
                }
            },
            chunk = inbox.recv() => {
                let Some(chunk) = chunk else { break };
                buffer.extend_from_slice(&chunk);
                drain_responses(&mut buffer, &mut pending, &unsolicited);
            },
            else => break,
        }
    }
}

async fn handle_send<T: Transport>(
    transport: &mut T,
    pending: &mut HashMap<MessageId, Responder>,
    send: SendCommand,
) {
    let SendCommand { message, message_id, respond_to } = send;

    let envelope = match message.into_envelope() {
        Ok(envelope) => envelope,
        Err(error) => {
            let _ = respond_to.send(Err(ControlError::SendFailed(error.to_string())));
            return;
        },
    };
    let mut bytes = BytesMut::with_capacity(envelope.encoded_len());
    envelope.encode(&mut bytes);

    if !transport.send_control_message(bytes.freeze()).await {
        let _ = respond_to.send(Err(ControlError::SendFailed("control transport has no open connection".to_owned())));
        return;
    }

    pending.insert(message_id, respond_to);
}

/// Decode as many complete messages as are buffered, resolving any
/// matching pending responder and forwarding anything else — an unmatched
/// `messageId` (already timed out, or never sent by this process) or a
/// message type that carries no `messageId` at all — to `unsolicited`
/// rather than silently dropping it.
fn drain_responses(
    buffer: &mut BytesMut,
    pending: &mut HashMap<MessageId, Responder>,
    unsolicited: &mpsc::Sender<GuestMessage>,
) {
    loop {
        match spice_proto::payloads::try_read_message(buffer) {
            Ok(TryRead::Incomplete) => return,
            Ok(TryRead::Message { consumed, message, .. }) => {
                bytes::Buf::advance(buffer, consumed);
                if let Some(message_id) = response_message_id(&message) {
                    if let Some(responder) = pending.remove(&message_id) {
                        let _ = responder.send(Ok(message));
                        continue;
                    }
                }
                tracing::debug!(?message, "control message did not match a pending request, dispatching as unsolicited");
                let _ = unsolicited.try_send(message);
            },
            Err(error) => {
                tracing::warn!(%error, "control channel decode error, clearing buffer");
                buffer.clear();
                return;
            },
        }
    }
}

fn response_message_id(message: &GuestMessage) -> Option<MessageId> {
    match message {
        GuestMessage::SessionList(list) => Some(MessageId(list.message_id)),
        GuestMessage::ShortcutList(list) => Some(MessageId(list.message_id)),
        GuestMessage::Ack(Ack { message_id }) => Some(MessageId(*message_id)),
        GuestMessage::Error(GuestError { message_id, .. }) => message_id.map(MessageId),
        _ => None,
    }
}

fn unexpected(message: GuestMessage) -> ControlError {
    if let GuestMessage::Error(error) = message {
        return ControlError::GuestError { code: error.code, message: error.message };
    }
    ControlError::UnexpectedResponse(format!("{message:?}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use spice_proto::RawEnvelope;
    use spice_proto::payloads::guest;
    use spice_proto::payloads::shared::SessionInfo;
    use spice_transport::TransportConfig;

    use super::*;

    fn guest_envelope_bytes(message: &GuestMessage) -> Bytes {
        let message_type = message.message_type().as_byte();
        let payload = match message {
            GuestMessage::SessionList(m) => serde_json::to_vec(m).unwrap(),
            GuestMessage::ShortcutList(m) => serde_json::to_vec(m).unwrap(),
            GuestMessage::Ack(m) => serde_json::to_vec(m).unwrap(),
            GuestMessage::Error(m) => serde_json::to_vec(m).unwrap(),
            _ => unreachable!("test only emits control responses"),
        };
        let envelope = RawEnvelope::new(message_type, Bytes::from(payload));
        let mut bytes = BytesMut::with_capacity(envelope.encoded_len());
        envelope.encode(&mut bytes);
        bytes.freeze()
    }

    /// A transport whose `set_control_callback` sender the test can recover
    /// (via `control_tx`) to push scripted responses directly, bypassing
    /// the usual video-stream machinery entirely.
    struct DirectControlTransport {
        sent: Arc<Mutex<Vec<Bytes>>>,
        control_tx: Arc<Mutex<Option<mpsc::Sender<Bytes>>>>,
    }

    impl Transport for DirectControlTransport {
        async fn open_stream(
            &mut self,
            _config: &TransportConfig,
            _window_id: u32,
        ) -> Result<(spice_transport::Subscription, spice_transport::StreamHandles), spice_transport::TransportError>
        {
            unreachable!("control channel tests do not open a video stream")
        }

        async fn close_stream(&mut self, _subscription: &spice_transport::Subscription) {}

        async fn send_mouse_event(
            &mut self,
            _subscription: &spice_transport::Subscription,
            _event: spice_proto::payloads::host::MouseInput,
        ) -> Result<(), spice_transport::TransportError> {
            Ok(())
        }

        async fn send_keyboard_event(
            &mut self,
            _subscription: &spice_transport::Subscription,
            _event: spice_proto::payloads::host::KeyboardInput,
        ) -> Result<(), spice_transport::TransportError> {
            Ok(())
        }

        async fn send_clipboard(
            &mut self,
            _subscription: &spice_transport::Subscription,
            _data: spice_proto::payloads::host::ClipboardData,
        ) -> Result<(), spice_transport::TransportError> {
            Ok(())
        }

        async fn request_clipboard(
            &mut self,
            _subscription: &spice_transport::Subscription,
        ) -> Result<(), spice_transport::TransportError> {
            Ok(())
        }

        async fn send_drag_drop_event(
            &mut self,
            _subscription: &spice_transport::Subscription,
            _event: spice_proto::payloads::host::DragDropEvent,
        ) -> Result<(), spice_transport::TransportError> {
            Ok(())
        }

        fn set_control_callback(&mut self, sink: mpsc::Sender<Bytes>) {
            *self.control_tx.lock().unwrap() = Some(sink);
        }

        async fn send_control_message(&mut self, bytes: Bytes) -> bool {
            self.sent.lock().unwrap().push(bytes);
            true
        }
    }

    fn build_channel() -> (ControlChannel, Arc<Mutex<Vec<Bytes>>>, Arc<Mutex<Option<mpsc::Sender<Bytes>>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let control_tx = Arc::new(Mutex::new(None));
        let transport = DirectControlTransport { sent: sent.clone(), control_tx: control_tx.clone() };
        let (unsolicited_tx, _unsolicited_rx) = mpsc::channel(8);
        let channel = ControlChannel::spawn(transport, Duration::from_millis(200), unsolicited_tx);
        channel.set_connected(true);
        (channel, sent, control_tx)
    }

    /// Like `build_channel`, but also returns the unsolicited-message
    /// receiver so a test can assert on what an orphan response dispatches.
    fn build_channel_with_unsolicited() -> (
        ControlChannel,
        Arc<Mutex<Vec<Bytes>>>,
        Arc<Mutex<Option<mpsc::Sender<Bytes>>>>,
        mpsc::Receiver<GuestMessage>,
    ) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let control_tx = Arc::new(Mutex::new(None));
        let transport = DirectControlTransport { sent: sent.clone(), control_tx: control_tx.clone() };
        let (unsolicited_tx, unsolicited_rx) = mpsc::channel(8);
        let channel = ControlChannel::spawn(transport, Duration::from_millis(200), unsolicited_tx);
        channel.set_connected(true);
        (channel, sent, control_tx, unsolicited_rx)
    }

    async fn wait_for_sent(sent: &Arc<Mutex<Vec<Bytes>>>) -> Bytes {
        loop {
            if let Some(bytes) = sent.lock().unwrap().first().cloned() {
                return bytes;
            }
            tokio::task::yield_now().await;
        }
    }

    async fn control_sender(control_tx: &Arc<Mutex<Option<mpsc::Sender<Bytes>>>>) -> mpsc::Sender<Bytes> {
        loop {
            if let Some(tx) = control_tx.lock().unwrap().clone() {
                return tx;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn list_sessions_matches_response_by_message_id() {
        let (channel, sent, control_tx) = build_channel();

        let request = channel.list_sessions();
        let bytes = wait_for_sent(&sent).await;
        let (envelope, _) = RawEnvelope::try_decode(&bytes).expect("request envelope");
        let decoded: ListSessions = serde_json::from_slice(&envelope.payload).expect("list sessions payload");

        let response = GuestMessage::SessionList(guest::SessionList {
            message_id: decoded.message_id,
            sessions: vec![SessionInfo {
                id: "abc".into(),
                pid: 42,
                exe: "notepad.exe".into(),
                title: None,
                start: 0,
                last_activity: 0,
                state: "running".into(),
                window_count: 1,
            }],
        });
        control_sender(&control_tx).await.send(guest_envelope_bytes(&response)).await.unwrap();

        let sessions = request.await.expect("sessions returned");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "abc");
    }

    #[tokio::test]
    async fn concurrent_requests_are_matched_independently() {
        let (channel, sent, control_tx) = build_channel();

        let sessions_request = channel.list_sessions();
        let shortcuts_request = channel.list_shortcuts();

        // Both requests are in flight; resolve them out of order.
        let mut seen = Vec::new();
        while seen.len() < 2 {
            let bytes_vec = sent.lock().unwrap().clone();
            for bytes in &bytes_vec {
                let (envelope, _) = RawEnvelope::try_decode(bytes).expect("request envelope");
                if envelope.message_type == HostMessage::ListShortcuts(ListShortcuts { message_id: 0 }).message_type().as_byte()
                    && !seen.contains(&1)
                {
                    let decoded: ListShortcuts = serde_json::from_slice(&envelope.payload).unwrap();
                    let response = GuestMessage::ShortcutList(guest::ShortcutList {
                        message_id: decoded.message_id,
                        shortcuts: vec![],
                    });
                    control_sender(&control_tx).await.send(guest_envelope_bytes(&response)).await.unwrap();
                    seen.push(1);
                } else if envelope.message_type
                    == HostMessage::ListSessions(ListSessions { message_id: 0 }).message_type().as_byte()
                    && !seen.contains(&0)
                {
                    let decoded: ListSessions = serde_json::from_slice(&envelope.payload).unwrap();
                    let response = GuestMessage::SessionList(guest::SessionList {
                        message_id: decoded.message_id,
                        sessions: vec![],
                    });
                    control_sender(&control_tx).await.send(guest_envelope_bytes(&response)).await.unwrap();
                    seen.push(0);
                }
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(sessions_request.await.expect("sessions ok"), Vec::<SessionInfo>::new());
        assert!(shortcuts_request.await.expect("shortcuts ok").is_empty());
    }

    #[tokio::test]
    async fn times_out_when_no_response_arrives() {
        let (channel, _sent, _control_tx) = build_channel();
        let error = channel.list_shortcuts().await.expect_err("no responder, must time out");
        assert_eq!(error, ControlError::Timeout);
    }

    #[tokio::test]
    async fn not_connected_fails_fast_without_sending() {
        let (channel, sent, _control_tx) = build_channel();
        channel.set_connected(false);
        let error = channel.list_sessions().await.expect_err("disconnected");
        assert_eq!(error, ControlError::NotConnected);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn guest_error_response_surfaces_as_guest_error() {
        let (channel, sent, control_tx) = build_channel();

        let request = channel.close_session("missing".into());
        let bytes = wait_for_sent(&sent).await;
        let (envelope, _) = RawEnvelope::try_decode(&bytes).expect("request envelope");
        let decoded: CloseSession = serde_json::from_slice(&envelope.payload).expect("close session payload");

        let response = GuestMessage::Error(guest::Error {
            message_id: Some(decoded.message_id),
            code: spice_proto::payloads::error_code::SESSION_NOT_FOUND,
            message: "no such session".into(),
        });
        control_sender(&control_tx).await.send(guest_envelope_bytes(&response)).await.unwrap();

        let error = request.await.expect_err("guest reported an error");
        assert_eq!(
            error,
            ControlError::GuestError {
                code: spice_proto::payloads::error_code::SESSION_NOT_FOUND,
                message: "no such session".into(),
            }
        );
    }

    #[tokio::test]
    async fn orphan_response_is_dispatched_to_the_unsolicited_observer() {
        let (_channel, _sent, control_tx, mut unsolicited_rx) = build_channel_with_unsolicited();

        // No request is outstanding, so this response matches nothing pending.
        let response = GuestMessage::SessionList(guest::SessionList { message_id: 999, sessions: vec![] });
        control_sender(&control_tx).await.send(guest_envelope_bytes(&response)).await.unwrap();

        let observed = unsolicited_rx.recv().await.expect("orphan response reaches the observer");
        assert_eq!(observed, response);
    }
}
