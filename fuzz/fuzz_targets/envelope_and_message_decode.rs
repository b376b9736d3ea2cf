//! Fuzzes the envelope framer and the guest-message decoder it feeds.
//!
//! Neither `RawEnvelope::try_decode` nor `try_read_message` should ever
//! panic on arbitrary bytes; malformed input is expected to surface as
//! `Incomplete` or a `ProtocolError`, never a crash.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spice_proto::RawEnvelope;
use spice_proto::payloads::try_read_message;

fuzz_target!(|data: &[u8]| {
    let _ = RawEnvelope::try_decode(data);
    let _ = try_read_message(data);
});
