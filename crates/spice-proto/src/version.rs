//! Protocol version packing and compatibility rules.

use serde::{Deserialize, Serialize};

/// A `(major, minor)` protocol version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Major version. A mismatch is always incompatible.
    pub major: u16,
    /// Minor version. The guest may run with an equal or lower minor than the host.
    pub minor: u16,
}

impl ProtocolVersion {
    /// Construct a version pair.
    #[must_use]
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Pack as `(major << 16) | minor`.
    #[must_use]
    pub fn pack(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }

    /// Unpack from `(major << 16) | minor`.
    #[must_use]
    pub fn unpack(value: u32) -> Self {
        Self { major: (value >> 16) as u16, minor: (value & 0xFFFF) as u16 }
    }

    /// True iff `guest` has the same major version and a minor version no
    /// greater than this (host) version's minor.
    #[must_use]
    pub fn is_compatible(&self, guest: ProtocolVersion) -> bool {
        self.major == guest.major && guest.minor <= self.minor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let v = ProtocolVersion::new(3, 7);
        assert_eq!(ProtocolVersion::unpack(v.pack()), v);
    }

    #[test]
    fn compatible_same_major_lower_minor() {
        let host = ProtocolVersion::new(1, 5);
        assert!(host.is_compatible(ProtocolVersion::new(1, 3)));
        assert!(host.is_compatible(ProtocolVersion::new(1, 5)));
        assert!(!host.is_compatible(ProtocolVersion::new(1, 6)));
        assert!(!host.is_compatible(ProtocolVersion::new(2, 0)));
    }
}
