//! Shared-memory reader errors.

use thiserror::Error;

/// Errors from shared-frame-buffer header validation and slot reads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShmError {
    /// Header magic did not match `0x4D524657`.
    #[error("invalid magic: {actual:#010x}")]
    InvalidMagic {
        /// The magic actually read.
        actual: u32,
    },

    /// Header version did not match the supported version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Supported version.
        expected: u32,
        /// Version found in the header.
        actual: u32,
    },

    /// Region is smaller than its own declared header/slot layout requires.
    #[error("buffer too small: required {required}, actual {actual}")]
    BufferTooSmall {
        /// Minimum byte length required.
        required: usize,
        /// Byte length actually available.
        actual: usize,
    },

    /// A slot index derived from the ring indices would read out of bounds.
    #[error("slot index out of bounds: index {index}, slot count {slot_count}")]
    SlotIndexOutOfBounds {
        /// The computed slot index.
        index: u32,
        /// The region's slot count.
        slot_count: u32,
    },

    /// The region could not be mapped at construction time.
    #[error("mapping failed: {0}")]
    MappingFailed(String),
}
