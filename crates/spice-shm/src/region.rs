//! A raw view over a shared-memory mapping.
//!
//! The guest writes slot data and advances `writeIndex` concurrently with the
//! host reading it, so the mapping cannot be represented as an ordinary
//! `&[u8]` (Rust assumes shared references are stable). [`ShmRegion`] instead
//! holds a raw pointer and exposes unsafe, precondition-documented accessors,
//! the same shape as a lock-free shared ring buffer's region handle.

use std::sync::Arc;

use crate::error::ShmError;
use crate::header::{HEADER_SIZE, RegionHeader};
use crate::slot::SlotHeader;

/// A shared memory mapping the reader does not assume exclusive ownership of.
pub struct ShmRegion {
    ptr: *const u8,
    len: usize,
}

// Safety: the region is intentionally shared across the host/guest boundary;
// callers are responsible for the memory staying valid and mapped for the
// lifetime of every `ShmRegion` built over it (see `from_raw_parts`).
unsafe impl Send for ShmRegion {}
unsafe impl Sync for ShmRegion {}

impl ShmRegion {
    /// Wrap a raw mapped region.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes for as long as any
    /// `ShmRegion`/`ShmReader` built from it is alive, and must be at least
    /// 4-byte aligned (64-byte aligned per the region header's own
    /// requirement) so that the atomic index fields can be accessed without
    /// undefined behavior.
    #[must_use]
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Total length of the mapped region in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slice(&self, offset: usize, size: usize) -> Result<&[u8], ShmError> {
        let end = offset
            .checked_add(size)
            .ok_or(ShmError::BufferTooSmall { required: usize::MAX, actual: self.len })?;
        if end > self.len {
            return Err(ShmError::BufferTooSmall { required: end, actual: self.len });
        }
        // Safety: `ptr` is valid for `len` bytes per the constructor contract,
        // and `offset + size <= len` was just checked.
        Ok(unsafe { std::slice::from_raw_parts(self.ptr.add(offset), size) })
    }

    /// Borrow the header at `offset` within this region.
    ///
    /// # Safety
    ///
    /// `offset` must be 4-byte aligned and `offset + HEADER_SIZE <= len()`.
    pub unsafe fn header_at(&self, offset: usize) -> &RegionHeader {
        // Safety: precondition forwarded to the caller; the cast is valid
        // because `RegionHeader`'s only non-plain-data members are atomics,
        // which are safe to access through a shared reference.
        unsafe { &*(self.ptr.add(offset).cast::<RegionHeader>()) }
    }

    /// Borrow a slot header at `offset` within `offset + size <= len()`.
    pub fn slot_header_at(&self, offset: usize) -> Result<&SlotHeader, ShmError> {
        let bytes = self.slice(offset, crate::slot::SLOT_HEADER_SIZE)?;
        SlotHeader::from_bytes(bytes)
            .ok_or(ShmError::BufferTooSmall { required: crate::slot::SLOT_HEADER_SIZE, actual: bytes.len() })
    }

    /// Copy `size` bytes at `offset` into a freshly owned buffer.
    pub fn copy_out(&self, offset: usize, size: usize) -> Result<Vec<u8>, ShmError> {
        Ok(self.slice(offset, size)?.to_vec())
    }
}

/// A view into either an owned region or a per-window slice of a parent
/// shared region, bounds-checked once at construction.
pub struct RegionView {
    region: Arc<ShmRegion>,
    base_offset: usize,
    size: usize,
    owns_region: bool,
}

impl RegionView {
    /// Create a view that owns the entire region.
    #[must_use]
    pub fn owning(region: Arc<ShmRegion>) -> Self {
        let size = region.len();
        Self { region, base_offset: 0, size, owns_region: true }
    }

    /// Create a bounds-checked sub-view of a parent region, as used for a
    /// single window's slice of a process-wide shared region.
    pub fn sub_view(
        region: Arc<ShmRegion>,
        offset: usize,
        size: usize,
    ) -> Result<Self, ShmError> {
        let end = offset.checked_add(size).ok_or(ShmError::BufferTooSmall {
            required: usize::MAX,
            actual: region.len(),
        })?;
        if end > region.len() {
            return Err(ShmError::BufferTooSmall { required: end, actual: region.len() });
        }
        Ok(Self { region, base_offset: offset, size, owns_region: false })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn owns_region(&self) -> bool {
        self.owns_region
    }

    /// Borrow the region header at the start of this view.
    ///
    /// # Safety
    ///
    /// The view must be at least [`HEADER_SIZE`] bytes, checked by the caller
    /// via `validate()` before any other access.
    pub unsafe fn header(&self) -> &RegionHeader {
        // Safety: forwarded to `ShmRegion::header_at`; callers validate size
        // via `validate()` before calling this.
        unsafe { self.region.header_at(self.base_offset) }
    }

    pub fn slot_header(&self, relative_offset: usize) -> Result<&SlotHeader, ShmError> {
        self.region.slot_header_at(self.base_offset + relative_offset)
    }

    pub fn copy_out(&self, relative_offset: usize, size: usize) -> Result<Vec<u8>, ShmError> {
        self.region.copy_out(self.base_offset + relative_offset, size)
    }

    pub fn has_minimum_size(&self, required: usize) -> Result<(), ShmError> {
        if self.size < required {
            return Err(ShmError::BufferTooSmall { required, actual: self.size });
        }
        Ok(())
    }
}

const _: () = assert!(HEADER_SIZE == 64);
