//! Host-side session logic for the Spice client runtime: per-window stream
//! state machines, the shared-memory frame router, and the control channel,
//! wired together by an async driver loop over a [`spice_transport::Transport`].
//!
//! This crate owns no I/O itself beyond the driver's use of
//! [`spice_transport::Transport`] and [`spice_shm::ShmReader`]; the stream and
//! router types are pure `handle(event) -> actions` state machines, and the
//! control channel is the one component that drives its own request/response
//! waiting, as described on [`control_channel::ControlChannel`].
//!
//! Test fixtures build [`spice_shm::ShmRegion`]s over leaked byte buffers,
//! which needs the same narrow `unsafe` surface `spice-shm` itself scopes.

#![allow(unsafe_code)]

pub mod control_channel;
pub mod driver;
pub mod environment;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod router;
pub mod stream;

pub use control_channel::ControlChannel;
pub use driver::{Observation, RouterHandle, WindowDriver};
pub use environment::{Environment, SystemEnvironment};
pub use error::{ControlError, StreamError};
pub use ids::{MessageId, WindowId};
pub use metrics::StreamMetrics;
pub use router::{FrameRouter, RouterAction, RouterEvent};
pub use stream::{
    ClipboardDelivery, ConnectionState, DeliveredFrame, ReconnectPolicy, Stream, StreamAction, StreamEvent,
};
