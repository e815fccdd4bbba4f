//! Message header codec
//!
//! The header is bit-packed and big-endian on the wire. Full mode is 16
//! bytes; micro mode narrows the wide fields to one byte each for an 8-byte
//! footprint.
//!
//! # Wire Format (full mode)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   Hop Limit   |EMK(3)|CFG|PRI |          Heart Rate           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Source ID (4)                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       Destination ID (4)                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Payload Length        | Checksum (hi) | Checksum (lo) |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Micro mode keeps bytes 0-1 identical (so `cfg_hdr` classifies either
//! class), then carries heart_rate, src_id, dst_id, and len as single bytes
//! followed by the split checksum.

use super::{Error, PRIORITY_MASK, Priority, Result, SizeClass, pack_meta, unpack_meta};

/// Mesh message header
///
/// `cfg_hdr` is not stored here; it is derived from the [`SizeClass`] passed
/// at encode time and recovered from the wire at decode time.
///
/// Priority writes mask with the 3-bit field mask rather than rejecting, so
/// raw values 5-7 round-trip bit-exactly even though they name no defined
/// level. Use [`Header::priority_level`] for the strict typed view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    hop_limit: u8,
    earmark: u8,
    priority: u8,
    heart_rate: u16,
    src_id: u32,
    dst_id: u32,
    len: u16,
    check_sum: u16,
}

impl Header {
    /// Create an empty header (all fields zero)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get hop limit
    #[must_use]
    pub const fn hop_limit(&self) -> u8 {
        self.hop_limit
    }

    /// Set hop limit
    pub fn set_hop_limit(&mut self, hop_limit: u8) {
        self.hop_limit = hop_limit;
    }

    /// Increment hop limit, saturating at 255
    pub fn add_hop_limit(&mut self) {
        self.hop_limit = self.hop_limit.saturating_add(1);
    }

    /// Get the 3-bit earmark tag
    #[must_use]
    pub const fn earmark(&self) -> u8 {
        self.earmark
    }

    /// Set the earmark tag, masked to 3 bits
    pub fn set_earmark(&mut self, earmark: u8) {
        self.earmark = earmark & 0x7;
    }

    /// Get the raw 3-bit priority value
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// Get the typed priority level; raw values 5-7 fail
    pub fn priority_level(&self) -> Result<Priority> {
        Priority::try_from(self.priority)
    }

    /// Set priority from a defined level
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority.as_u8();
    }

    /// Set priority from a raw value, masked to 3 bits
    pub fn set_priority_raw(&mut self, priority: u8) {
        self.priority = priority & PRIORITY_MASK;
    }

    /// Get heart rate
    #[must_use]
    pub const fn heart_rate(&self) -> u16 {
        self.heart_rate
    }

    /// Set heart rate
    pub fn set_heart_rate(&mut self, heart_rate: u16) {
        self.heart_rate = heart_rate;
    }

    /// Get source node identifier
    #[must_use]
    pub const fn src_id(&self) -> u32 {
        self.src_id
    }

    /// Set source node identifier
    pub fn set_src(&mut self, src_id: u32) {
        self.src_id = src_id;
    }

    /// Get destination node identifier
    #[must_use]
    pub const fn dst_id(&self) -> u32 {
        self.dst_id
    }

    /// Set destination node identifier
    pub fn set_dst(&mut self, dst_id: u32) {
        self.dst_id = dst_id;
    }

    /// Get total payload length (serialized block chain, sub-headers included)
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.len
    }

    /// True when the header declares no payload
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set total payload length
    pub fn set_len(&mut self, len: u16) {
        self.len = len;
    }

    /// Get checksum as one logical 16-bit value
    #[must_use]
    pub const fn check_sum(&self) -> u16 {
        self.check_sum
    }

    /// Set checksum
    pub fn set_checksum(&mut self, check_sum: u16) {
        self.check_sum = check_sum;
    }

    /// Encode into `out`, appending exactly `class.header_size()` bytes
    ///
    /// # Errors
    ///
    /// Micro mode fails with [`Error::FieldOverflow`] when heart_rate,
    /// src_id, dst_id, or len exceeds one byte.
    pub fn encode_into(&self, class: SizeClass, out: &mut Vec<u8>) -> Result<()> {
        let meta = pack_meta(self.earmark, class.cfg_bits(), self.priority);

        match class {
            SizeClass::Full => {
                out.reserve(super::FULL_HEADER_SIZE);
                out.push(self.hop_limit);
                out.push(meta);
                out.extend_from_slice(&self.heart_rate.to_be_bytes());
                out.extend_from_slice(&self.src_id.to_be_bytes());
                out.extend_from_slice(&self.dst_id.to_be_bytes());
                out.extend_from_slice(&self.len.to_be_bytes());
                // checksum stays split on the wire, single u16 everywhere else
                out.push((self.check_sum >> 8) as u8);
                out.push((self.check_sum & 0xFF) as u8);
            }
            SizeClass::Micro => {
                check_micro_width("heart_rate", u64::from(self.heart_rate))?;
                check_micro_width("src_id", u64::from(self.src_id))?;
                check_micro_width("dst_id", u64::from(self.dst_id))?;
                check_micro_width("len", u64::from(self.len))?;

                out.reserve(super::MICRO_HEADER_SIZE);
                out.push(self.hop_limit);
                out.push(meta);
                out.push(self.heart_rate as u8);
                out.push(self.src_id as u8);
                out.push(self.dst_id as u8);
                out.push(self.len as u8);
                out.push((self.check_sum >> 8) as u8);
                out.push((self.check_sum & 0xFF) as u8);
            }
        }

        Ok(())
    }

    /// Encode to owned bytes
    pub fn to_bytes(&self, class: SizeClass) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(class.header_size());
        self.encode_into(class, &mut out)?;
        Ok(out)
    }

    /// Decode a header, discovering the size class from its `cfg_hdr` bits
    ///
    /// # Errors
    ///
    /// Fails with [`Error::MalformedHeader`] when the slice is shorter than
    /// the class's header width or the discriminator is invalid.
    pub fn decode(bytes: &[u8]) -> Result<(Self, SizeClass)> {
        if bytes.len() < super::MIN_CLASSIFY_SIZE {
            return Err(Error::MalformedHeader {
                needed: super::MIN_CLASSIFY_SIZE,
                got: bytes.len(),
                cfg: 0,
            });
        }

        let (earmark, cfg, priority) = unpack_meta(bytes[1]);
        let Some(class) = SizeClass::from_cfg(cfg) else {
            return Err(Error::MalformedHeader {
                needed: super::MICRO_HEADER_SIZE,
                got: bytes.len(),
                cfg,
            });
        };

        if bytes.len() < class.header_size() {
            return Err(Error::MalformedHeader {
                needed: class.header_size(),
                got: bytes.len(),
                cfg,
            });
        }

        let header = match class {
            SizeClass::Full => Self {
                hop_limit: bytes[0],
                earmark,
                priority,
                heart_rate: u16::from_be_bytes([bytes[2], bytes[3]]),
                src_id: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
                dst_id: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
                len: u16::from_be_bytes([bytes[12], bytes[13]]),
                check_sum: u16::from_be_bytes([bytes[14], bytes[15]]),
            },
            SizeClass::Micro => Self {
                hop_limit: bytes[0],
                earmark,
                priority,
                heart_rate: u16::from(bytes[2]),
                src_id: u32::from(bytes[3]),
                dst_id: u32::from(bytes[4]),
                len: u16::from(bytes[5]),
                check_sum: u16::from_be_bytes([bytes[6], bytes[7]]),
            },
        };

        Ok((header, class))
    }
}

fn check_micro_width(field: &'static str, value: u64) -> Result<()> {
    let max = SizeClass::Micro.field_max();
    if value > max {
        return Err(Error::FieldOverflow { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        let mut h = Header::new();
        h.set_hop_limit(12);
        h.set_earmark(0b101);
        h.set_priority(Priority::Level3);
        h.set_heart_rate(250);
        h.set_src(0xAB);
        h.set_dst(0xCD);
        h.set_len(40);
        h.set_checksum(0xBEEF);
        h
    }

    #[test]
    fn test_full_header_layout() {
        let bytes = sample().to_bytes(SizeClass::Full).unwrap();
        assert_eq!(bytes.len(), super::super::FULL_HEADER_SIZE);

        assert_eq!(bytes[0], 12);
        assert_eq!(bytes[1], 0b101_01_011); // earmark / CFG_FULL / priority 3
        assert_eq!(&bytes[2..4], &250u16.to_be_bytes());
        assert_eq!(&bytes[4..8], &0xABu32.to_be_bytes());
        assert_eq!(&bytes[8..12], &0xCDu32.to_be_bytes());
        assert_eq!(&bytes[12..14], &40u16.to_be_bytes());
        assert_eq!(bytes[14], 0xBE); // checksum high
        assert_eq!(bytes[15], 0xEF); // checksum low
    }

    #[test]
    fn test_micro_header_layout() {
        let bytes = sample().to_bytes(SizeClass::Micro).unwrap();
        assert_eq!(bytes.len(), super::super::MICRO_HEADER_SIZE);

        assert_eq!(bytes[0], 12);
        assert_eq!(bytes[1], 0b101_10_011); // earmark / CFG_MICRO / priority 3
        assert_eq!(bytes[2], 250);
        assert_eq!(bytes[3], 0xAB);
        assert_eq!(bytes[4], 0xCD);
        assert_eq!(bytes[5], 40);
        assert_eq!(bytes[6], 0xBE);
        assert_eq!(bytes[7], 0xEF);
    }

    #[test]
    fn test_header_roundtrip_both_classes() {
        for class in [SizeClass::Full, SizeClass::Micro] {
            let original = sample();
            let bytes = original.to_bytes(class).unwrap();
            let (decoded, decoded_class) = Header::decode(&bytes).unwrap();
            assert_eq!(decoded_class, class);
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_decode_short_slice() {
        let bytes = sample().to_bytes(SizeClass::Full).unwrap();
        let result = Header::decode(&bytes[..10]);
        assert!(matches!(
            result,
            Err(Error::MalformedHeader { needed: 16, got: 10, .. })
        ));
    }

    #[test]
    fn test_decode_invalid_cfg() {
        let mut bytes = sample().to_bytes(SizeClass::Full).unwrap();
        bytes[1] &= !(0b11 << 3); // cfg_hdr = 0b00
        assert!(matches!(
            Header::decode(&bytes),
            Err(Error::MalformedHeader { cfg: 0b00, .. })
        ));
    }

    #[test]
    fn test_micro_field_overflow() {
        let mut h = sample();
        h.set_src(300);
        assert!(matches!(
            h.to_bytes(SizeClass::Micro),
            Err(Error::FieldOverflow { field: "src_id", value: 300, max: 255 })
        ));
    }

    #[test]
    fn test_priority_raw_masking() {
        let mut h = Header::new();
        h.set_priority_raw(5); // in the 3-bit field, no defined level
        assert_eq!(h.priority(), 5);
        assert!(h.priority_level().is_err());

        h.set_priority_raw(0b1111_1010); // stray high bits dropped
        assert_eq!(h.priority(), 0b010);
    }

    #[test]
    fn test_hop_limit_saturates() {
        let mut h = Header::new();
        h.set_hop_limit(254);
        h.add_hop_limit();
        assert_eq!(h.hop_limit(), 255);
        h.add_hop_limit();
        assert_eq!(h.hop_limit(), 255);
    }
}
