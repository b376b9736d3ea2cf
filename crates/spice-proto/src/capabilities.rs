//! Guest capability flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// 32-bit capability flag set reported by the guest agent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct GuestCapabilities: u32 {
        /// Guest reports window create/move/resize/close events.
        const WINDOW_TRACKING = 1 << 0;
        /// Guest can duplicate the desktop for a full-screen stream.
        const DESKTOP_DUPLICATION = 1 << 1;
        /// Guest supports clipboard synchronization.
        const CLIPBOARD_SYNC = 1 << 2;
        /// Guest supports drag-and-drop.
        const DRAG_DROP = 1 << 3;
        /// Guest supports icon extraction.
        const ICON_EXTRACTION = 1 << 4;
        /// Guest reports shortcut (desktop/start-menu) detection.
        const SHORTCUT_DETECTION = 1 << 5;
        /// Guest is high-DPI aware.
        const HIGH_DPI = 1 << 6;
        /// Guest supports multiple monitors.
        const MULTI_MONITOR = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_checks_individual_flags() {
        let caps = GuestCapabilities::CLIPBOARD_SYNC | GuestCapabilities::HIGH_DPI;
        assert!(caps.contains(GuestCapabilities::CLIPBOARD_SYNC));
        assert!(!caps.contains(GuestCapabilities::DRAG_DROP));
    }

    #[test]
    fn round_trips_through_bits() {
        let caps = GuestCapabilities::WINDOW_TRACKING | GuestCapabilities::MULTI_MONITOR;
        let bits = caps.bits();
        assert_eq!(GuestCapabilities::from_bits_truncate(bits), caps);
    }
}
