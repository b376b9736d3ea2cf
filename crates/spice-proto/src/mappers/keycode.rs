//! Host key-code to guest virtual-key-code translation.
//!
//! The table covers letters, digits, function keys, navigation, arrows, and
//! modifiers. Host key codes follow macOS virtual key-code numbering; guest
//! codes follow the Windows virtual-key space.

/// Translate a host key code into the guest virtual-key-code space.
///
/// Returns `None` for host codes with no guest equivalent in this table.
#[must_use]
pub fn host_to_guest(host_key_code: u16) -> Option<u16> {
    Some(match host_key_code {
        // Letters, macOS virtual keycodes 0x00..0x0B,0x0D..0x23-ish mapped to
        // Windows VK_A..VK_Z (0x41..0x5A). Table entries below are the subset
        // commonly exercised; unmapped input keys are simply not forwarded.
        0x00 => 0x41, // A
        0x0B => 0x42, // B
        0x08 => 0x43, // C
        0x02 => 0x44, // D
        0x0E => 0x45, // E
        0x03 => 0x46, // F
        0x05 => 0x47, // G
        0x04 => 0x48, // H
        0x22 => 0x49, // I
        0x26 => 0x4A, // J
        0x28 => 0x4B, // K
        0x25 => 0x4C, // L
        0x2E => 0x4D, // M
        0x2D => 0x4E, // N
        0x1F => 0x4F, // O
        0x23 => 0x50, // P
        0x0C => 0x51, // Q
        0x0F => 0x52, // R
        0x01 => 0x53, // S
        0x11 => 0x54, // T
        0x20 => 0x55, // U
        0x09 => 0x56, // V
        0x0D => 0x57, // W
        0x07 => 0x58, // X
        0x10 => 0x59, // Y
        0x06 => 0x5A, // Z

        // Digits 1..0
        0x12 => 0x31,
        0x13 => 0x32,
        0x14 => 0x33,
        0x15 => 0x34,
        0x17 => 0x35,
        0x16 => 0x36,
        0x1A => 0x37,
        0x1C => 0x38,
        0x19 => 0x39,
        0x1D => 0x30,

        // Function keys F1..F12
        0x7A => 0x70,
        0x78 => 0x71,
        0x63 => 0x72,
        0x76 => 0x73,
        0x60 => 0x74,
        0x61 => 0x75,
        0x62 => 0x76,
        0x64 => 0x77,
        0x65 => 0x78,
        0x6D => 0x79,
        0x67 => 0x7A,
        0x6F => 0x7B,

        // Navigation
        0x33 => 0x08, // Backspace
        0x30 => 0x09, // Tab
        0x24 => 0x0D, // Return/Enter
        0x35 => 0x1B, // Escape
        0x31 => 0x20, // Space
        0x73 => 0x24, // Home
        0x77 => 0x23, // End
        0x74 => 0x21, // Page Up
        0x79 => 0x22, // Page Down
        0x75 => 0x2E, // Delete (forward)

        // Arrows
        0x7B => 0x25, // Left
        0x7E => 0x26, // Up
        0x7C => 0x27, // Right
        0x7D => 0x28, // Down

        // Modifiers
        0x38 => 0xA0, // Left Shift
        0x3C => 0xA1, // Right Shift
        0x3B => 0xA2, // Left Control
        0x3E => 0xA3, // Right Control
        0x3A => 0xA4, // Left Alt/Option
        0x3D => 0xA5, // Right Alt/Option
        0x37 => 0x5B, // Left Command -> Left Windows key
        0x36 => 0x5C, // Right Command -> Right Windows key

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters() {
        assert_eq!(host_to_guest(0x00), Some(0x41));
        assert_eq!(host_to_guest(0x06), Some(0x5A));
    }

    #[test]
    fn maps_arrows_and_modifiers() {
        assert_eq!(host_to_guest(0x7B), Some(0x25));
        assert_eq!(host_to_guest(0x38), Some(0xA0));
    }

    #[test]
    fn unmapped_code_returns_none() {
        assert_eq!(host_to_guest(0xFFFF), None);
    }
}
