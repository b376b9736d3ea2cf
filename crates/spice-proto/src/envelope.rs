//! Envelope framing: `[type:1][length:4 LE][payload:length]`.
//!
//! This module is deliberately payload-agnostic: it only knows how to frame
//! and unframe a type byte plus an opaque payload. Payload interpretation
//! (JSON decode into a concrete message) lives in [`crate::payloads`].

use bytes::{Buf, BufMut, Bytes};

use crate::error::ProtocolError;

/// Number of bytes in the fixed envelope prefix (`type` + `length`).
pub const HEADER_LEN: usize = 5;

/// A framed `[type][length][payload]` envelope with an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnvelope {
    /// The wire message-type byte (not yet validated against the taxonomy).
    pub message_type: u8,
    /// The raw payload bytes.
    pub payload: Bytes,
}

impl RawEnvelope {
    /// Wrap a type byte and payload into an envelope.
    #[must_use]
    pub fn new(message_type: u8, payload: Bytes) -> Self {
        Self { message_type, payload }
    }

    /// Encode `[type:1][length:4 LE][payload]` into `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.message_type);
        dst.put_u32_le(self.payload.len() as u32);
        dst.put_slice(&self.payload);
    }

    /// Total encoded size of this envelope.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Attempt to decode one envelope from the front of `src`.
    ///
    /// Returns `Ok(None)` when fewer than `5 + length` bytes are present
    /// (the buffer is left untouched in that case). Does not currently
    /// return an error variant of its own; malformed length prefixes simply
    /// never become complete (there is no magic/version to validate at this
    /// framing layer, unlike the shared-memory region header).
    pub fn try_decode(src: &[u8]) -> Option<(Self, usize)> {
        if src.len() < HEADER_LEN {
            return None;
        }
        let message_type = src[0];
        let length = u32::from_le_bytes([src[1], src[2], src[3], src[4]]) as usize;
        let total = HEADER_LEN + length;
        if src.len() < total {
            return None;
        }
        let payload = Bytes::copy_from_slice(&src[HEADER_LEN..total]);
        Some((Self { message_type, payload }, total))
    }
}

/// Outcome of [`try_read_envelope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Fewer than a full envelope's worth of bytes are buffered.
    Incomplete,
    /// A complete envelope was read; `consumed` bytes should be dropped from
    /// the front of the buffer.
    Complete {
        /// The decoded envelope.
        envelope: RawEnvelope,
        /// Number of bytes consumed from `src`.
        consumed: usize,
    },
}

/// Incremental envelope reader: consumes as many complete envelopes as are
/// available one at a time, leaving trailing partial bytes untouched.
#[must_use]
pub fn try_read_envelope(src: &[u8]) -> ReadOutcome {
    match RawEnvelope::try_decode(src) {
        Some((envelope, consumed)) => ReadOutcome::Complete { envelope, consumed },
        None => ReadOutcome::Incomplete,
    }
}

/// Advance a cursor-like buffer by `consumed` bytes. Thin wrapper kept
/// separate so callers that hold a `bytes::Buf` can share the same
/// consumption logic as callers holding a plain slice.
pub fn advance(buf: &mut impl Buf, consumed: usize) {
    buf.advance(consumed);
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    fn arb_envelope() -> impl Strategy<Value = RawEnvelope> {
        (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..256))
            .prop_map(|(message_type, payload)| RawEnvelope::new(message_type, Bytes::from(payload)))
    }

    proptest! {
        #[test]
        fn round_trip(envelope in arb_envelope()) {
            let mut buf = BytesMut::new();
            envelope.encode(&mut buf);
            let (decoded, consumed) = RawEnvelope::try_decode(&buf).expect("complete envelope");
            prop_assert_eq!(decoded, envelope);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn length_prefix_equals_payload_length(envelope in arb_envelope()) {
            let mut buf = BytesMut::new();
            envelope.encode(&mut buf);
            let length = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
            prop_assert_eq!(length, envelope.payload.len());
        }

        #[test]
        fn incremental_parse_stops_on_trailing_bytes(
            envelopes in proptest::collection::vec(arb_envelope(), 0..6),
            trailing in proptest::collection::vec(any::<u8>(), 0..4),
        ) {
            let mut buf = BytesMut::new();
            for e in &envelopes {
                e.encode(&mut buf);
            }
            buf.extend_from_slice(&trailing);

            let mut cursor = &buf[..];
            let mut read = Vec::new();
            loop {
                match try_read_envelope(cursor) {
                    ReadOutcome::Complete { envelope, consumed } => {
                        read.push(envelope);
                        cursor = &cursor[consumed..];
                    },
                    ReadOutcome::Incomplete => break,
                }
            }
            prop_assert_eq!(read, envelopes);
            prop_assert!(cursor.len() < HEADER_LEN || cursor.len() == trailing.len());
        }
    }

    #[test]
    fn incomplete_on_short_header() {
        let buf = [0x80u8, 0x01, 0x00];
        assert_eq!(try_read_envelope(&buf), ReadOutcome::Incomplete);
    }

    #[test]
    fn incomplete_on_short_payload() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x80);
        buf.put_u32_le(10);
        buf.put_slice(&[0u8; 3]);
        assert_eq!(try_read_envelope(&buf), ReadOutcome::Incomplete);
    }
}
