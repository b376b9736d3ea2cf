//! Host modifier bitfield to the protocol's fixed 6-flag modifier set.

use bitflags::bitflags;

bitflags! {
    /// Modifier flags as carried on the wire (6-flag set).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const FN = 1 << 5;
    }
}

/// Host-side modifier bit positions (macOS `NSEvent.ModifierFlags` order).
mod host_bits {
    pub const SHIFT: u32 = 1 << 17;
    pub const CONTROL: u32 = 1 << 18;
    pub const ALT: u32 = 1 << 19;
    pub const META: u32 = 1 << 20;
    pub const CAPS_LOCK: u32 = 1 << 16;
    pub const FN: u32 = 1 << 23;
}

/// Translate a host modifier bitfield into the wire's 6-flag [`Modifiers`] set.
#[must_use]
pub fn host_to_wire(host_flags: u32) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::SHIFT, host_flags & host_bits::SHIFT != 0);
    out.set(Modifiers::CONTROL, host_flags & host_bits::CONTROL != 0);
    out.set(Modifiers::ALT, host_flags & host_bits::ALT != 0);
    out.set(Modifiers::META, host_flags & host_bits::META != 0);
    out.set(Modifiers::CAPS_LOCK, host_flags & host_bits::CAPS_LOCK != 0);
    out.set(Modifiers::FN, host_flags & host_bits::FN != 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_combined_flags() {
        let host = host_bits::SHIFT | host_bits::CONTROL;
        let wire = host_to_wire(host);
        assert!(wire.contains(Modifiers::SHIFT));
        assert!(wire.contains(Modifiers::CONTROL));
        assert!(!wire.contains(Modifiers::ALT));
    }

    #[test]
    fn no_modifiers_is_empty() {
        assert_eq!(host_to_wire(0), Modifiers::empty());
    }
}
