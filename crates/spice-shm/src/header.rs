//! The 64-byte aligned region header.
//!
//! `write_index`, `read_index`, and `flags` are the only fields mutated after
//! construction, and are the only fields either side writes concurrently, so
//! they are plain atomics. Everything else is set once by whichever side
//! (the guest) creates the region and is never rewritten.

use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

/// Region header magic, ASCII-ish for `"WFRM"`.
pub const MAGIC: u32 = 0x4D52_4657;

/// The only supported header version.
pub const VERSION: u32 = 1;

/// Size in bytes of [`RegionHeader`].
pub const HEADER_SIZE: usize = 64;

bitflags! {
    /// Region-level liveness/state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionFlags: u32 {
        const GUEST_ACTIVE = 1 << 0;
        const HOST_ACTIVE = 1 << 1;
        const NEEDS_RESET = 1 << 2;
        const COMPRESSED = 1 << 3;
    }
}

/// The shared-frame-buffer region header.
///
/// Laid out to occupy exactly 64 bytes so slot zero always begins at
/// `offset = 64` regardless of compiler padding decisions: the fixed fields
/// total 40 bytes and the explicit reserved tail makes up the rest.
#[repr(C)]
pub struct RegionHeader {
    pub magic: u32,
    pub version: u32,
    pub total_size: u32,
    pub slot_count: u32,
    pub slot_size: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub write_index: AtomicU32,
    pub read_index: AtomicU32,
    pub flags: AtomicU32,
    _reserved: [u8; 24],
}

const _: () = assert!(std::mem::size_of::<RegionHeader>() == HEADER_SIZE);
const _: () = assert!(std::mem::align_of::<RegionHeader>() <= 64);

impl RegionHeader {
    /// Read the ring write index (written by the guest). Acquire ordering:
    /// the host must observe a fully-published slot before reading its data.
    #[inline]
    pub fn write_index(&self) -> u32 {
        self.write_index.load(Ordering::Acquire)
    }

    /// Read the ring read index (written by the host itself).
    #[inline]
    pub fn read_index(&self) -> u32 {
        self.read_index.load(Ordering::Relaxed)
    }

    /// Advance the read index by one, modulo `slot_count`. Release ordering:
    /// the guest must see the slot as free only after the host is done
    /// reading it.
    pub fn advance_read_index(&self) {
        let slot_count = self.slot_count.max(1);
        let next = (self.read_index.load(Ordering::Relaxed) + 1) % slot_count;
        self.read_index.store(next, Ordering::Release);
    }

    /// Current region flags.
    #[inline]
    pub fn flags(&self) -> RegionFlags {
        RegionFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Set or clear the `host-active` flag. This and `read_index` are the
    /// only fields the host ever writes.
    pub fn set_host_active(&self, active: bool) {
        loop {
            let current = self.flags.load(Ordering::Acquire);
            let next = if active {
                current | RegionFlags::HOST_ACTIVE.bits()
            } else {
                current & !RegionFlags::HOST_ACTIVE.bits()
            };
            if self
                .flags
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Number of frames available to read: `(write - read) mod slot_count`.
    #[must_use]
    pub fn available_frames(&self) -> u32 {
        let slot_count = self.slot_count.max(1);
        let write = self.write_index();
        let read = self.read_index();
        write.wrapping_sub(read) % slot_count
    }

    /// True iff the ring is non-empty, i.e. `write != read`.
    #[must_use]
    pub fn has_frames(&self) -> bool {
        self.write_index() != self.read_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_64_bytes() {
        assert_eq!(std::mem::size_of::<RegionHeader>(), 64);
    }
}
