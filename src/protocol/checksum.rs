//! 16-bit wire checksum
//!
//! CRC-16/CCITT-FALSE over the serialized header-plus-payload region with
//! the two embedded checksum bytes treated as zero. CRC-16 is
//! order-sensitive and detects every single-bit error. The checksum is
//! computed over the wire representation, so any accessor mutation after
//! encoding invalidates it until restamped.

use super::{Error, Result, SizeClass, unpack_meta};

/// CRC-16/CCITT-FALSE polynomial
const CRC_POLY: u16 = 0x1021;

/// CRC-16/CCITT-FALSE initial value
const CRC_INIT: u16 = 0xFFFF;

fn crc_step(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte) << 8;
    for _ in 0..8 {
        if crc & 0x8000 != 0 {
            crc = (crc << 1) ^ CRC_POLY;
        } else {
            crc <<= 1;
        }
    }
    crc
}

/// Compute the checksum over a serialized message
///
/// `bytes` is the full wire buffer (header + payload); the checksum field at
/// the class's offset is excluded by hashing zeros in its place.
#[must_use]
pub fn compute(bytes: &[u8], class: SizeClass) -> u16 {
    let offset = class.checksum_offset();
    let end = (offset + 2).min(bytes.len());
    let mut crc = CRC_INIT;

    for &byte in &bytes[..offset.min(bytes.len())] {
        crc = crc_step(crc, byte);
    }
    for _ in offset.min(bytes.len())..end {
        crc = crc_step(crc, 0);
    }
    for &byte in &bytes[end..] {
        crc = crc_step(crc, byte);
    }

    crc
}

/// Recompute and compare against the embedded checksum
///
/// The size class is discovered from the `cfg_hdr` bits, so this works on
/// raw wire buffers of either class. The checksummed region is exactly
/// header + declared `len`; trailing bytes past it (transport padding) are
/// ignored, matching [`MessageBuffer::load`](super::MessageBuffer::load).
///
/// # Errors
///
/// [`Error::MalformedHeader`] when the buffer is too short to classify or to
/// hold its header; [`Error::TruncatedBlock`] when it holds fewer payload
/// bytes than the header declares; [`Error::ChecksumMismatch`] when the
/// recomputed value disagrees with the embedded one. Mismatches are
/// reported, never corrected.
pub fn verify(bytes: &[u8]) -> Result<()> {
    if bytes.len() < super::MIN_CLASSIFY_SIZE {
        return Err(Error::MalformedHeader {
            needed: super::MIN_CLASSIFY_SIZE,
            got: bytes.len(),
            cfg: 0,
        });
    }

    let (_, cfg, _) = unpack_meta(bytes[1]);
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

    let wire = checked_region(bytes, class)?;

    let offset = class.checksum_offset();
    let found = u16::from_be_bytes([wire[offset], wire[offset + 1]]);
    let expected = compute(wire, class);

    if found != expected {
        return Err(Error::ChecksumMismatch { expected, found });
    }

    Ok(())
}

/// Trim a wire buffer to its checksummed region: header + declared `len`
///
/// The caller has already established that `bytes` holds a full header of
/// the given class.
pub(crate) fn checked_region(bytes: &[u8], class: SizeClass) -> Result<&[u8]> {
    let declared = match class {
        SizeClass::Full => u16::from_be_bytes([bytes[12], bytes[13]]) as usize,
        SizeClass::Micro => bytes[5] as usize,
    };
    let total = class.header_size() + declared;
    if bytes.len() < total {
        return Err(Error::TruncatedBlock {
            claimed: declared,
            remaining: bytes.len() - class.header_size(),
        });
    }
    Ok(&bytes[..total])
}
