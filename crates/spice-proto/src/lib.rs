//! Wire protocol definitions for the Spice client runtime: message-type
//! taxonomy, envelope framing, typed payloads, and host/guest mappers.
//!
//! This crate performs no I/O; it only encodes and decodes bytes.

pub mod capabilities;
pub mod envelope;
pub mod error;
pub mod mappers;
pub mod message_type;
pub mod payloads;
pub mod version;

pub use capabilities::GuestCapabilities;
pub use envelope::{ReadOutcome, RawEnvelope};
pub use error::ProtocolError;
pub use message_type::{Direction, MessageType};
pub use payloads::{GuestMessage, HostMessage, TryRead, try_read_message};
pub use version::ProtocolVersion;
