//! Transport abstraction for a single guest connection.
//!
//! This crate knows how to open a byte-stream to a guest (over TCP or a
//! shared file descriptor, or — in tests — a scripted mock) and exposes it as
//! bounded channels. It does not parse envelopes or frame payloads; that is
//! the per-window stream's job, in `spice-core`.

pub mod config;
pub mod error;
pub mod mock;
pub mod native;
pub mod subscription;
pub mod transport;

pub use config::TransportConfig;
pub use error::{CloseReason, TransportError};
pub use mock::{MockScript, MockTransport, RecordedCalls, ScriptedChunk};
pub use native::NativeTransport;
pub use subscription::Subscription;
pub use transport::{StreamHandles, Transport};
