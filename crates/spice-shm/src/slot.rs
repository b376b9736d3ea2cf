//! The 36-byte slot header preceding each ring slot's frame payload.
//!
//! Packed and read via `zerocopy` so validation is a zero-copy cast over the
//! raw slice rather than a manual field-by-field parse. Because `repr(packed)`
//! forbids taking references to misaligned fields, multi-byte values are
//! stored as byte arrays with explicit little-endian accessors, and `Debug`/
//! `PartialEq` are implemented by hand (derive would require field refs).

use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size in bytes of [`SlotHeader`].
pub const SLOT_HEADER_SIZE: usize = 36;

bitflags! {
    /// Per-slot flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotFlags: u32 {
        const COMPRESSED = 1 << 0;
        const KEY_FRAME = 1 << 1;
    }
}

#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct SlotHeader {
    window_id: [u8; 4],
    frame_number: [u8; 8],
    width: [u8; 4],
    height: [u8; 4],
    stride: [u8; 4],
    format: [u8; 4],
    data_size: [u8; 4],
    flags: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<SlotHeader>() == SLOT_HEADER_SIZE);

impl SlotHeader {
    /// Zero-copy parse a slot header from the front of `bytes`.
    ///
    /// Returns `None` if fewer than [`SLOT_HEADER_SIZE`] bytes are available.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<&Self> {
        Self::ref_from_prefix(bytes).ok().map(|(header, _rest)| header)
    }

    #[must_use]
    pub fn window_id(&self) -> u32 {
        u32::from_le_bytes(self.window_id)
    }

    #[must_use]
    pub fn frame_number(&self) -> u64 {
        u64::from_le_bytes(self.frame_number)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        u32::from_le_bytes(self.width)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        u32::from_le_bytes(self.height)
    }

    #[must_use]
    pub fn stride(&self) -> u32 {
        u32::from_le_bytes(self.stride)
    }

    #[must_use]
    pub fn format(&self) -> u32 {
        u32::from_le_bytes(self.format)
    }

    #[must_use]
    pub fn data_size(&self) -> u32 {
        u32::from_le_bytes(self.data_size)
    }

    #[must_use]
    pub fn flags(&self) -> SlotFlags {
        SlotFlags::from_bits_truncate(u32::from_le_bytes(self.flags))
    }
}

impl std::fmt::Debug for SlotHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotHeader")
            .field("window_id", &self.window_id())
            .field("frame_number", &self.frame_number())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("stride", &self.stride())
            .field("format", &self.format())
            .field("data_size", &self.data_size())
            .field("flags", &self.flags())
            .finish()
    }
}

impl PartialEq for SlotHeader {
    fn eq(&self, other: &Self) -> bool {
        self.window_id() == other.window_id()
            && self.frame_number() == other.frame_number()
            && self.width() == other.width()
            && self.height() == other.height()
            && self.stride() == other.stride()
            && self.format() == other.format()
            && self.data_size() == other.data_size()
            && self.flags() == other.flags()
    }
}
