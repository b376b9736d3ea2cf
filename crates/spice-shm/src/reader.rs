//! The shared-frame-buffer reader: validate, walk the slot ring, read.

use crate::error::ShmError;
use crate::header::{HEADER_SIZE, MAGIC, VERSION};
use crate::region::RegionView;
use crate::slot::{SLOT_HEADER_SIZE, SlotFlags};

/// One frame read out of the ring, with freshly owned pixel bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFrame {
    pub window_id: u32,
    pub frame_number: u64,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: u32,
    pub payload: Vec<u8>,
    pub is_compressed: bool,
}

/// Reads frames out of a shared-frame-buffer region (or a per-window slice of
/// one). Never blocks.
pub struct ShmReader {
    view: RegionView,
    validated: bool,
}

impl ShmReader {
    /// Wrap a region view. Call [`ShmReader::validate`] before any other
    /// operation; all other methods assume a validated header.
    #[must_use]
    pub fn new(view: RegionView) -> Self {
        Self { view, validated: false }
    }

    /// Whether this reader owns its underlying mapping outright, or is one of
    /// several per-window slices sharing a single parent mapping.
    #[must_use]
    pub fn owns_region(&self) -> bool {
        self.view.owns_region()
    }

    /// Validate region size, magic, and version.
    pub fn validate(&mut self) -> Result<(), ShmError> {
        self.view.has_minimum_size(HEADER_SIZE)?;
        // Safety: size was just checked above.
        let header = unsafe { self.view.header() };
        if header.magic != MAGIC {
            return Err(ShmError::InvalidMagic { actual: header.magic });
        }
        if header.version != VERSION {
            return Err(ShmError::VersionMismatch { expected: VERSION, actual: header.version });
        }
        self.validated = true;
        Ok(())
    }

    fn header(&self) -> &crate::header::RegionHeader {
        debug_assert!(self.validated, "ShmReader used before validate()");
        // Safety: `validate()` checked the minimum size for the header.
        unsafe { self.view.header() }
    }

    /// True iff at least one frame is available to read.
    #[must_use]
    pub fn has_frames(&self) -> bool {
        self.header().has_frames()
    }

    /// Number of frames currently available to read.
    #[must_use]
    pub fn available_frame_count(&self) -> u32 {
        self.header().available_frames()
    }

    /// Read the next frame out of the ring, if any.
    ///
    /// Advances `readIndex` on success. Returns `Ok(None)` when the ring is
    /// empty. Bounds-checks the slot's declared `dataSize` against the
    /// region size before copying.
    pub fn read_next_frame(&mut self) -> Result<Option<ReadFrame>, ShmError> {
        let header = self.header();
        if !header.has_frames() {
            return Ok(None);
        }

        let slot_count = header.slot_count;
        let slot_size = header.slot_size as usize;
        let read_index = header.read_index();
        if read_index >= slot_count {
            return Err(ShmError::SlotIndexOutOfBounds { index: read_index, slot_count });
        }

        let slot_offset = HEADER_SIZE + read_index as usize * slot_size;
        let slot = self.view.slot_header(slot_offset)?;
        let data_size = slot.data_size() as usize;
        let data_offset = slot_offset + SLOT_HEADER_SIZE;

        self.view.has_minimum_size(data_offset + data_size).map_err(|_| ShmError::BufferTooSmall {
            required: data_offset + data_size,
            actual: self.view.len(),
        })?;

        let frame = ReadFrame {
            window_id: slot.window_id(),
            frame_number: slot.frame_number(),
            width: slot.width(),
            height: slot.height(),
            stride: slot.stride(),
            format: slot.format(),
            payload: self.view.copy_out(data_offset, data_size)?,
            is_compressed: slot.flags().contains(SlotFlags::COMPRESSED),
        };

        header.advance_read_index();
        Ok(Some(frame))
    }

    /// Set or clear the `host-active` flag.
    pub fn set_host_active(&self, active: bool) {
        self.header().set_host_active(active);
    }
}
