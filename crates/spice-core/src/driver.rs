//! The async driver loop: owns a real transport connection for one window,
//! drives its [`Stream`] state machine, and shares a [`RouterHandle`] with
//! the other windows of the same session.
//!
//! Like [`crate::control_channel::ControlChannel`], [`WindowDriver`] is a
//! cheap, cloneable handle to a background actor task; the actor is the only
//! owner of the real [`Transport`] and the only place that turns a
//! [`StreamAction`] into actual I/O. Forwarding sub-tasks, spawned once per
//! successfully opened stream, fan chunks/clipboard/close events into one
//! internal channel the actor also selects on — this avoids juggling
//! `Option`-guarded `select!` branches across reconnects.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use spice_proto::payloads::guest::{WindowBufferAllocated, WindowMetadata};
use spice_proto::payloads::host::{ClipboardData, DragDropEvent, KeyboardInput, MouseInput};
use spice_shm::{ReadFrame, ShmError, ShmRegion};
use spice_transport::{CloseReason, Subscription, Transport, TransportConfig};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::environment::Environment;
use crate::ids::WindowId;
use crate::metrics::StreamMetrics;
use crate::router::{FrameRouter, RouterAction, RouterEvent};
use crate::stream::{ClipboardDelivery, ConnectionState, DeliveredFrame, ReconnectPolicy, Stream, StreamAction, StreamEvent};

const COMMAND_CAPACITY: usize = 32;
const INTERNAL_CAPACITY: usize = 64;

/// Deliveries a [`WindowDriver`] makes to its caller.
#[derive(Debug, Clone)]
pub enum Observation {
    Metadata(WindowMetadata),
    Frame(DeliveredFrame),
    ShmFrame { window_id: WindowId, frame: ReadFrame },
    Clipboard(ClipboardDelivery),
    StateChanged(ConnectionState),
    Disconnected { reason: Option<CloseReason> },
}

/// A shared, lock-guarded [`FrameRouter`]: one per session, cloned into
/// every [`WindowDriver`] so buffer allocations and frame-ready notices from
/// any window's stream reach the same registry (matching the corpus's
/// mutex-guarded serial-executor idiom for state shared across tasks).
#[derive(Clone)]
pub struct RouterHandle(Arc<Mutex<FrameRouter>>);

impl RouterHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(FrameRouter::new())))
    }

    pub async fn set_shared_memory_region(&self, region: Arc<ShmRegion>) {
        self.0.lock().await.handle(RouterEvent::SetSharedMemoryRegion { region });
    }

    pub async fn clear_shared_memory_region(&self) {
        self.0.lock().await.handle(RouterEvent::ClearSharedMemoryRegion);
    }

    async fn register_stream(&self, window_id: WindowId) {
        self.0.lock().await.handle(RouterEvent::RegisterStream { window_id });
    }

    async fn unregister_stream(&self, window_id: WindowId) {
        self.0.lock().await.handle(RouterEvent::UnregisterStream { window_id });
    }

    async fn handle_buffer_allocation(&self, allocation: WindowBufferAllocated) {
        self.0.lock().await.handle(RouterEvent::HandleBufferAllocation { allocation });
    }

    async fn route_frame_ready(&self, window_id: WindowId, frame_number: u64) -> Vec<RouterAction> {
        self.0.lock().await.handle(RouterEvent::RouteFrameReady { window_id, frame_number })
    }

    async fn read_next_frame(&self, window_id: WindowId) -> Result<Option<ReadFrame>, ShmError> {
        self.0.lock().await.read_next_frame(window_id)
    }
}

impl Default for RouterHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The actor's internal protocol. Not exposed: callers only ever see
/// [`WindowDriver`]'s methods.
enum DriverCommand {
    Connect,
    Disconnect,
    Reconnect,
    Pause,
    Resume,
    SendMouse(MouseInput),
    SendKeyboard(KeyboardInput),
    SendClipboard(ClipboardData),
    RequestClipboard,
    SendDragDrop(DragDropEvent),
    MetricsSnapshot(oneshot::Sender<StreamMetrics>),
    ConnectionState(oneshot::Sender<ConnectionState>),
}

/// Events fanned in from the forwarding sub-task of whichever transport
/// stream is currently open, plus reconnect timers.
enum InternalEvent {
    Chunk(Bytes),
    ClipboardPushed(ClipboardData),
    Closed(CloseReason),
    ReconnectTimerFired(u64),
}

/// A cheap, cloneable handle to the actor task driving one window's stream.
#[derive(Clone)]
pub struct WindowDriver {
    commands: mpsc::Sender<DriverCommand>,
}

impl WindowDriver {
    /// Spawn the actor owning `transport`, and return a handle to it. The
    /// window stays disconnected until [`WindowDriver::connect`] is called.
    pub fn spawn<T, E>(
        transport: T,
        config: TransportConfig,
        window_id: WindowId,
        policy: ReconnectPolicy,
        env: E,
        router: RouterHandle,
        observations: mpsc::Sender<Observation>,
    ) -> Self
    where
        T: Transport + 'static,
        E: Environment,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(run_actor(transport, config, window_id, policy, env, router, observations, command_rx));
        Self { commands: command_tx }
    }

    pub async fn connect(&self) {
        let _ = self.commands.send(DriverCommand::Connect).await;
    }

    pub async fn disconnect(&self) {
        let _ = self.commands.send(DriverCommand::Disconnect).await;
    }

    pub async fn reconnect(&self) {
        let _ = self.commands.send(DriverCommand::Reconnect).await;
    }

    pub async fn pause(&self) {
        let _ = self.commands.send(DriverCommand::Pause).await;
    }

    pub async fn resume(&self) {
        let _ = self.commands.send(DriverCommand::Resume).await;
    }

    pub async fn send_mouse_event(&self, event: MouseInput) {
        let _ = self.commands.send(DriverCommand::SendMouse(event)).await;
    }

    pub async fn send_keyboard_event(&self, event: KeyboardInput) {
        let _ = self.commands.send(DriverCommand::SendKeyboard(event)).await;
    }

    pub async fn send_clipboard(&self, data: ClipboardData) {
        let _ = self.commands.send(DriverCommand::SendClipboard(data)).await;
    }

    pub async fn request_clipboard(&self) {
        let _ = self.commands.send(DriverCommand::RequestClipboard).await;
    }

    pub async fn send_drag_drop_event(&self, event: DragDropEvent) {
        let _ = self.commands.send(DriverCommand::SendDragDrop(event)).await;
    }

    /// Fetch a point-in-time metrics snapshot. Returns `None` if the actor
    /// has already shut down.
    pub async fn metrics_snapshot(&self) -> Option<StreamMetrics> {
        let (respond_to, response) = oneshot::channel();
        self.commands.send(DriverCommand::MetricsSnapshot(respond_to)).await.ok()?;
        response.await.ok()
    }

    /// Fetch the current connection state. Returns `None` if the actor has
    /// already shut down.
    pub async fn connection_state(&self) -> Option<ConnectionState> {
        let (respond_to, response) = oneshot::channel();
        self.commands.send(DriverCommand::ConnectionState(respond_to)).await.ok()?;
        response.await.ok()
    }
}

/// Owns the transport exclusively: executes every [`StreamAction`] the
/// embedded [`Stream`] returns, and forwards buffer/frame-ready notices to
/// the shared router.
#[allow(clippy::too_many_arguments)]
async fn run_actor<T, E>(
    mut transport: T,
    config: TransportConfig,
    window_id: WindowId,
    policy: ReconnectPolicy,
    env: E,
    router: RouterHandle,
    observations: mpsc::Sender<Observation>,
    mut commands: mpsc::Receiver<DriverCommand>,
) where
    T: Transport + 'static,
    E: Environment,
{
    let mut stream = Stream::new(policy);
    let (internal_tx, mut internal_rx) = mpsc::channel(INTERNAL_CAPACITY);
    let mut current_subscription: Option<Subscription> = None;

    loop {
        let state_before = stream.connection_state();
        let initial = tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match dispatch_command(command, &mut stream, window_id) {
                    Some(events) => events,
                    None => continue,
                }
            },
            event = internal_rx.recv() => {
                let Some(event) = event else { continue };
                match event {
                    InternalEvent::Chunk(chunk) => stream.handle(StreamEvent::BytesReceived { chunk }),
                    InternalEvent::ClipboardPushed(data) => stream.handle(StreamEvent::ClipboardPushed { data }),
                    InternalEvent::Closed(reason) => {
                        current_subscription = None;
                        stream.handle(StreamEvent::TransportClosed { reason })
                    },
                    InternalEvent::ReconnectTimerFired(epoch) => {
                        stream.handle(StreamEvent::ReconnectTimerFired { epoch })
                    },
                }
            },
            else => break,
        };

        run_to_completion(
            initial,
            &mut stream,
            &mut transport,
            &config,
            window_id,
            &env,
            &router,
            &observations,
            &internal_tx,
            &mut current_subscription,
        )
        .await;
        let state_after = stream.connection_state();
        if state_before != state_after {
            let _ = observations.send(Observation::StateChanged(state_after)).await;
        }
    }

    router.unregister_stream(window_id).await;
}

/// Translate one [`DriverCommand`] into the [`StreamEvent`] the stream
/// should see, resolving the two responder commands directly instead.
fn dispatch_command(command: DriverCommand, stream: &mut Stream, window_id: WindowId) -> Option<Vec<StreamAction>> {
    let event = match command {
        DriverCommand::Connect => StreamEvent::Connect { window_id },
        DriverCommand::Disconnect => StreamEvent::Disconnect,
        DriverCommand::Reconnect => StreamEvent::Reconnect,
        DriverCommand::Pause => StreamEvent::Pause,
        DriverCommand::Resume => StreamEvent::Resume,
        DriverCommand::SendMouse(event) => StreamEvent::SendMouseEvent(event),
        DriverCommand::SendKeyboard(event) => StreamEvent::SendKeyboardEvent(event),
        DriverCommand::SendClipboard(data) => StreamEvent::SendClipboard(data),
        DriverCommand::RequestClipboard => StreamEvent::RequestClipboard,
        DriverCommand::SendDragDrop(event) => StreamEvent::SendDragDropEvent(event),
        DriverCommand::MetricsSnapshot(respond_to) => {
            let _ = respond_to.send(stream.metrics_snapshot());
            return None;
        },
        DriverCommand::ConnectionState(respond_to) => {
            let _ = respond_to.send(stream.connection_state());
            return None;
        },
    };
    Some(stream.handle(event))
}

/// Drain a queue of actions, executing each and feeding back any
/// immediately-known follow-up event (currently only `OpenTransport`'s
/// result), until the queue is empty. Everything else that eventually needs
/// to re-enter the stream arrives later through `commands`/`internal_rx`.
#[allow(clippy::too_many_arguments)]
async fn run_to_completion<T, E>(
    initial: Vec<StreamAction>,
    stream: &mut Stream,
    transport: &mut T,
    config: &TransportConfig,
    window_id: WindowId,
    env: &E,
    router: &RouterHandle,
    observations: &mpsc::Sender<Observation>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    current_subscription: &mut Option<Subscription>,
) where
    T: Transport,
    E: Environment,
{
    let mut actions: VecDeque<StreamAction> = initial.into();
    while let Some(action) = actions.pop_front() {
        let follow_up = execute_action(
            action,
            transport,
            config,
            window_id,
            env,
            router,
            observations,
            internal_tx,
            current_subscription,
        )
        .await;
        if let Some(event) = follow_up {
            actions.extend(stream.handle(event));
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute_action<T, E>(
    action: StreamAction,
    transport: &mut T,
    config: &TransportConfig,
    window_id: WindowId,
    env: &E,
    router: &RouterHandle,
    observations: &mpsc::Sender<Observation>,
    internal_tx: &mpsc::Sender<InternalEvent>,
    current_subscription: &mut Option<Subscription>,
) -> Option<StreamEvent>
where
    T: Transport,
    E: Environment,
{
    match action {
        StreamAction::OpenTransport => match transport.open_stream(config, window_id.0).await {
            Ok((subscription, handles)) => {
                *current_subscription = Some(subscription.clone());
                router.register_stream(window_id).await;
                tokio::spawn(forward_stream_handles(handles, internal_tx.clone()));
                Some(StreamEvent::TransportOpened { subscription })
            },
            Err(error) => Some(StreamEvent::TransportOpenFailed { error }),
        },
        StreamAction::CloseTransport { subscription } => {
            *current_subscription = None;
            transport.close_stream(&subscription).await;
            None
        },
        StreamAction::ScheduleReconnect { delay, epoch, .. } => {
            let env = env.clone();
            let internal_tx = internal_tx.clone();
            tokio::spawn(async move {
                env.sleep(delay).await;
                let _ = internal_tx.send(InternalEvent::ReconnectTimerFired(epoch)).await;
            });
            None
        },
        StreamAction::DeliverMetadata(metadata) => {
            let _ = observations.send(Observation::Metadata(metadata)).await;
            None
        },
        StreamAction::DeliverFrame(frame) => {
            let _ = observations.send(Observation::Frame(frame)).await;
            None
        },
        StreamAction::DeliverClipboard(delivery) => {
            let _ = observations.send(Observation::Clipboard(delivery)).await;
            None
        },
        StreamAction::ForwardMouseEvent(event) => {
            if let Some(subscription) = current_subscription.as_ref() {
                let _ = transport.send_mouse_event(subscription, event).await;
            }
            None
        },
        StreamAction::ForwardKeyboardEvent(event) => {
            if let Some(subscription) = current_subscription.as_ref() {
                let _ = transport.send_keyboard_event(subscription, event).await;
            }
            None
        },
        StreamAction::ForwardClipboard(data) => {
            if let Some(subscription) = current_subscription.as_ref() {
                let _ = transport.send_clipboard(subscription, data).await;
            }
            None
        },
        StreamAction::ForwardClipboardRequest => {
            if let Some(subscription) = current_subscription.as_ref() {
                let _ = transport.request_clipboard(subscription).await;
            }
            None
        },
        StreamAction::ForwardDragDropEvent(event) => {
            if let Some(subscription) = current_subscription.as_ref() {
                let _ = transport.send_drag_drop_event(subscription, event).await;
            }
            None
        },
        StreamAction::NotifyDisconnected { reason } => {
            let _ = observations.send(Observation::Disconnected { reason }).await;
            None
        },
        StreamAction::BufferAllocated(allocation) => {
            router.handle_buffer_allocation(allocation).await;
            None
        },
        StreamAction::FrameReady { frame_number } => {
            for action in router.route_frame_ready(window_id, frame_number).await {
                if let RouterAction::DeliverFrameReady { window_id, frame_number } = action {
                    if let Ok(Some(frame)) = router.read_next_frame(window_id).await {
                        let _ = observations.send(Observation::ShmFrame { window_id, frame }).await;
                    } else {
                        tracing::debug!(window_id = window_id.0, frame_number, "frame ready but no bytes to read");
                    }
                }
            }
            None
        },
    }
}

/// Spawned once per successfully opened stream: fans chunks, clipboard
/// pushes, and the eventual close reason into the actor's shared internal
/// channel, so the actor's own `select!` never needs to juggle a changing
/// set of per-connection receivers directly.
async fn forward_stream_handles(handles: spice_transport::StreamHandles, internal_tx: mpsc::Sender<InternalEvent>) {
    let spice_transport::StreamHandles { mut chunks, mut clipboard, closed } = handles;
    tokio::pin!(closed);
    loop {
        tokio::select! {
            chunk = chunks.recv() => match chunk {
                Some(chunk) => {
                    if internal_tx.send(InternalEvent::Chunk(chunk)).await.is_err() {
                        return;
                    }
                },
                None => {},
            },
            data = clipboard.recv() => match data {
                Some(data) => {
                    if internal_tx.send(InternalEvent::ClipboardPushed(data)).await.is_err() {
                        return;
                    }
                },
                None => {},
            },
            reason = &mut closed => {
                let reason = reason.unwrap_or(CloseReason::TransportError);
                let _ = internal_tx.send(InternalEvent::Closed(reason)).await;
                return;
            },
        }
    }
}
