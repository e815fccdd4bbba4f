//! Message priority levels and wire size classes

use std::fmt;

use super::{Error, PRIORITY_MASK, Result};

/// Message priority
///
/// Five defined levels carried in the 3-bit priority field of the header.
/// Raw wire values 5-7 are representable in the field but have no defined
/// level; converting them through [`Priority::try_from`] fails with
/// [`Error::InvalidPriority`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Priority {
    /// Background / bulk traffic
    #[default]
    Low = 0,
    /// Level 1
    Level1 = 1,
    /// Level 2
    Level2 = 2,
    /// Level 3
    Level3 = 3,
    /// Level 4 (highest defined level)
    Level4 = 4,
}

impl Priority {
    /// Convert to the 3-bit wire value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Level1),
            2 => Ok(Self::Level2),
            3 => Ok(Self::Level3),
            4 => Ok(Self::Level4),
            _ => Err(Error::InvalidPriority { value }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Level1 => "Level1",
            Self::Level2 => "Level2",
            Self::Level3 => "Level3",
            Self::Level4 => "Level4",
        };
        write!(f, "{name}")
    }
}

/// Wire size class
///
/// Both classes describe the same logical message; micro trades field width
/// for header and block overhead on constrained links. The class is carried
/// in the 2-bit `cfg_hdr` discriminator at byte 1 of every header, which is
/// laid out identically in both classes so a receiver can classify a buffer
/// before trusting any other field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizeClass {
    /// Reduced-footprint encoding: 8-byte header, 2-byte block sub-headers,
    /// 8-bit heart_rate/src/dst/len fields
    Micro,
    /// Standard encoding: 16-byte header, 6-byte block sub-headers with an
    /// explicit next-block offset, full field widths
    Full,
}

impl SizeClass {
    /// Decode from the `cfg_hdr` discriminator bits
    #[must_use]
    pub const fn from_cfg(cfg: u8) -> Option<Self> {
        match cfg {
            super::CFG_MICRO => Some(Self::Micro),
            super::CFG_FULL => Some(Self::Full),
            _ => None,
        }
    }

    /// The `cfg_hdr` discriminator bits for this class
    #[must_use]
    pub const fn cfg_bits(self) -> u8 {
        match self {
            Self::Micro => super::CFG_MICRO,
            Self::Full => super::CFG_FULL,
        }
    }

    /// Header width on the wire
    #[must_use]
    pub const fn header_size(self) -> usize {
        match self {
            Self::Micro => super::MICRO_HEADER_SIZE,
            Self::Full => super::FULL_HEADER_SIZE,
        }
    }

    /// Block sub-header width on the wire
    #[must_use]
    pub const fn block_header_size(self) -> usize {
        match self {
            Self::Micro => super::MICRO_BLOCK_HEADER_SIZE,
            Self::Full => super::FULL_BLOCK_HEADER_SIZE,
        }
    }

    /// Byte offset of the checksum high byte within the header
    #[must_use]
    pub const fn checksum_offset(self) -> usize {
        self.header_size() - 2
    }

    /// Largest value the class's heart_rate / src_id / dst_id / len and
    /// block type / len fields can carry
    #[must_use]
    pub const fn field_max(self) -> u64 {
        match self {
            Self::Micro => u8::MAX as u64,
            Self::Full => u16::MAX as u64,
        }
    }

    /// Largest node identifier the class can carry
    #[must_use]
    pub const fn id_max(self) -> u64 {
        match self {
            Self::Micro => u8::MAX as u64,
            Self::Full => u32::MAX as u64,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Micro => write!(f, "micro"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Pack the shared meta byte: earmark(3) / cfg_hdr(2) / priority(3), MSB first
#[must_use]
pub(crate) const fn pack_meta(earmark: u8, cfg: u8, priority: u8) -> u8 {
    ((earmark & 0x7) << 5) | ((cfg & 0x3) << 3) | (priority & PRIORITY_MASK)
}

/// Unpack the shared meta byte into (earmark, cfg_hdr, priority)
#[must_use]
pub(crate) const fn unpack_meta(byte: u8) -> (u8, u8, u8) {
    (byte >> 5, (byte >> 3) & 0x3, byte & PRIORITY_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_roundtrip() {
        for raw in 0..=4u8 {
            let p = Priority::try_from(raw).unwrap();
            assert_eq!(p.as_u8(), raw);
        }
    }

    #[test]
    fn test_priority_undefined_levels_rejected() {
        for raw in 5..=7u8 {
            assert!(matches!(
                Priority::try_from(raw),
                Err(Error::InvalidPriority { value }) if value == raw
            ));
        }
    }

    #[test]
    fn test_size_class_cfg_roundtrip() {
        for class in [SizeClass::Micro, SizeClass::Full] {
            assert_eq!(SizeClass::from_cfg(class.cfg_bits()), Some(class));
        }
        assert_eq!(SizeClass::from_cfg(0b00), None);
        assert_eq!(SizeClass::from_cfg(0b11), None);
    }

    #[test]
    fn test_meta_byte_packing() {
        let byte = pack_meta(0b101, 0b01, 0b011);
        assert_eq!(byte, 0b101_01_011);

        let (earmark, cfg, priority) = unpack_meta(byte);
        assert_eq!(earmark, 0b101);
        assert_eq!(cfg, 0b01);
        assert_eq!(priority, 0b011);
    }

    #[test]
    fn test_meta_byte_masks_stray_bits() {
        // Inputs wider than their field must not leak into neighbours.
        let byte = pack_meta(0xFF, 0xFF, 0xFF);
        assert_eq!(byte, 0xFF);
        let byte = pack_meta(0, 0, 0b1111_1101);
        assert_eq!(byte, 0b101);
    }
}
