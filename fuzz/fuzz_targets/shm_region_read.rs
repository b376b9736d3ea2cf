//! Fuzzes shared-frame-buffer validation and ring-read over an arbitrary
//! byte buffer treated as a mapped region.
//!
//! `data` is always owned by this process for the duration of the call (no
//! guest concurrently mutates it), so building a region over it is sound
//! even though the type itself models an unsynchronized shared mapping.
//! `validate`/`read_next_frame` should reject anything malformed rather
//! than panic or read out of bounds.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spice_shm::{RegionView, ShmReader, ShmRegion};

fuzz_target!(|data: &[u8]| {
    let region = unsafe { ShmRegion::from_raw_parts(data.as_ptr(), data.len()) };
    let mut reader = ShmReader::new(RegionView::owning(std::sync::Arc::new(region)));
    if reader.validate().is_ok() {
        for _ in 0..64 {
            match reader.read_next_frame() {
                Ok(Some(_)) => continue,
                _ => break,
            }
        }
    }
});
