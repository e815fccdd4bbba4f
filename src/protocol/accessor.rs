//! Raw-buffer field accessors
//!
//! [`MessageView`] and [`MessageViewMut`] read and patch individual header
//! fields and walk the serialized block chain without a full decode/encode
//! round-trip. The size class is discovered once from the `cfg_hdr` bits at
//! construction, so a view self-configures from wire data alone.
//!
//! Mutating any field through [`MessageViewMut`] invalidates the embedded
//! checksum; callers must [`MessageViewMut::restamp_checksum`] before the
//! buffer is handed to a transport.

use super::{
    Error, PRIORITY_MASK, Priority, Result, SizeClass, checksum, pack_meta, unpack_meta,
};

/// True when a serialized buffer uses the micro size class
///
/// Classifies purely from the `cfg_hdr` bits, independent of every other
/// field.
///
/// # Errors
///
/// [`Error::MalformedHeader`] when the buffer cannot reach byte 1 or the
/// discriminator is invalid.
pub fn is_micro(bytes: &[u8]) -> Result<bool> {
    Ok(classify(bytes)? == SizeClass::Micro)
}

fn classify(bytes: &[u8]) -> Result<SizeClass> {
    if bytes.len() < super::MIN_CLASSIFY_SIZE {
        return Err(Error::MalformedHeader {
            needed: super::MIN_CLASSIFY_SIZE,
            got: bytes.len(),
            cfg: 0,
        });
    }
    let (_, cfg, _) = unpack_meta(bytes[1]);
    SizeClass::from_cfg(cfg).ok_or(Error::MalformedHeader {
        needed: super::MICRO_HEADER_SIZE,
        got: bytes.len(),
        cfg,
    })
}

fn classify_checked(bytes: &[u8]) -> Result<SizeClass> {
    let class = classify(bytes)?;
    if bytes.len() < class.header_size() {
        return Err(Error::MalformedHeader {
            needed: class.header_size(),
            got: bytes.len(),
            cfg: class.cfg_bits(),
        });
    }
    Ok(class)
}

// Per-class field byte ranges. Bytes 0-1 are shared between the classes.
fn heart_rate_at(bytes: &[u8], class: SizeClass) -> u16 {
    match class {
        SizeClass::Full => u16::from_be_bytes([bytes[2], bytes[3]]),
        SizeClass::Micro => u16::from(bytes[2]),
    }
}

fn src_at(bytes: &[u8], class: SizeClass) -> u32 {
    match class {
        SizeClass::Full => u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        SizeClass::Micro => u32::from(bytes[3]),
    }
}

fn dst_at(bytes: &[u8], class: SizeClass) -> u32 {
    match class {
        SizeClass::Full => u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        SizeClass::Micro => u32::from(bytes[4]),
    }
}

fn len_at(bytes: &[u8], class: SizeClass) -> u16 {
    match class {
        SizeClass::Full => u16::from_be_bytes([bytes[12], bytes[13]]),
        SizeClass::Micro => u16::from(bytes[5]),
    }
}

fn checksum_at(bytes: &[u8], class: SizeClass) -> u16 {
    let offset = class.checksum_offset();
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn payload_region(bytes: &[u8], class: SizeClass) -> Result<&[u8]> {
    let start = class.header_size();
    let declared = len_at(bytes, class) as usize;
    let available = bytes.len() - start;
    if declared > available {
        return Err(Error::TruncatedBlock {
            claimed: declared,
            remaining: available,
        });
    }
    Ok(&bytes[start..start + declared])
}

/// Read-only field access over a serialized message
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    bytes: &'a [u8],
    class: SizeClass,
}

impl<'a> MessageView<'a> {
    /// Wrap a serialized buffer, discovering its size class
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let class = classify_checked(bytes)?;
        Ok(Self { bytes, class })
    }

    /// The discovered size class
    #[must_use]
    pub const fn class(&self) -> SizeClass {
        self.class
    }

    /// Get hop limit
    #[must_use]
    pub const fn hop_limit(&self) -> u8 {
        self.bytes[0]
    }

    /// Get the 3-bit earmark tag
    #[must_use]
    pub fn earmark(&self) -> u8 {
        unpack_meta(self.bytes[1]).0
    }

    /// Get the raw 3-bit priority value (stray high bits never leak)
    #[must_use]
    pub fn priority(&self) -> u8 {
        unpack_meta(self.bytes[1]).2
    }

    /// Get heart rate
    #[must_use]
    pub fn heart_rate(&self) -> u16 {
        heart_rate_at(self.bytes, self.class)
    }

    /// Get source node identifier
    #[must_use]
    pub fn src_id(&self) -> u32 {
        src_at(self.bytes, self.class)
    }

    /// Get destination node identifier
    #[must_use]
    pub fn dst_id(&self) -> u32 {
        dst_at(self.bytes, self.class)
    }

    /// Get declared payload length
    #[must_use]
    pub fn len(&self) -> u16 {
        len_at(self.bytes, self.class)
    }

    /// True when the header declares no payload
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the embedded checksum as one logical 16-bit value
    #[must_use]
    pub fn check_sum(&self) -> u16 {
        checksum_at(self.bytes, self.class)
    }

    /// The serialized block-chain region, as declared by `len`
    ///
    /// # Errors
    ///
    /// [`Error::TruncatedBlock`] when the buffer holds fewer payload bytes
    /// than the header declares.
    pub fn payload(&self) -> Result<&'a [u8]> {
        payload_region(self.bytes, self.class)
    }

    /// Offset of the first block within the payload region, if any
    pub fn first_block(&self) -> Result<Option<usize>> {
        Ok(if self.payload()?.is_empty() { None } else { Some(0) })
    }

    /// Type tag of the block at `offset` within the payload region
    pub fn block_type(&self, offset: usize) -> Result<u16> {
        let sub = self.sub_header(offset)?;
        Ok(match self.class {
            SizeClass::Full => u16::from_be_bytes([sub[2], sub[3]]),
            SizeClass::Micro => u16::from(sub[0]),
        })
    }

    /// Data length of the block at `offset`
    pub fn block_len(&self, offset: usize) -> Result<u16> {
        let sub = self.sub_header(offset)?;
        Ok(match self.class {
            SizeClass::Full => u16::from_be_bytes([sub[4], sub[5]]),
            SizeClass::Micro => u16::from(sub[1]),
        })
    }

    /// Data bytes of the block at `offset`
    pub fn block_data(&self, offset: usize) -> Result<&'a [u8]> {
        let payload = self.payload()?;
        let len = self.block_len(offset)? as usize;
        let start = offset + self.class.block_header_size();
        if start + len > payload.len() {
            return Err(Error::TruncatedBlock {
                claimed: len,
                remaining: payload.len().saturating_sub(start),
            });
        }
        Ok(&payload[start..start + len])
    }

    /// Offset of the block following the one at `offset`, or `None` at the
    /// end of the chain
    ///
    /// Full mode reads the sub-header's explicit `next` field; micro mode
    /// derives the position from the cumulative length.
    pub fn block_next(&self, offset: usize) -> Result<Option<usize>> {
        let payload = self.payload()?;
        match self.class {
            SizeClass::Full => {
                let sub = self.sub_header(offset)?;
                let next = u16::from_be_bytes([sub[0], sub[1]]);
                if next == super::BLOCK_CHAIN_END {
                    return Ok(None);
                }
                let data_end =
                    offset + self.class.block_header_size() + self.block_len(offset)? as usize;
                let next = next as usize;
                if next < data_end || next >= payload.len() {
                    return Err(Error::TruncatedBlock {
                        claimed: next,
                        remaining: payload.len().saturating_sub(data_end),
                    });
                }
                Ok(Some(next))
            }
            SizeClass::Micro => {
                let next =
                    offset + self.class.block_header_size() + self.block_len(offset)? as usize;
                Ok(if next < payload.len() { Some(next) } else { None })
            }
        }
    }

    fn sub_header(&self, offset: usize) -> Result<&'a [u8]> {
        let payload = self.payload()?;
        let size = self.class.block_header_size();
        if offset + size > payload.len() {
            return Err(Error::TruncatedBlock {
                claimed: size,
                remaining: payload.len().saturating_sub(offset),
            });
        }
        Ok(&payload[offset..offset + size])
    }
}

/// Mutable field access over a serialized message
///
/// Every setter patches only its field's byte range; none of them restamps
/// the checksum.
#[derive(Debug)]
pub struct MessageViewMut<'a> {
    bytes: &'a mut [u8],
    class: SizeClass,
}

impl<'a> MessageViewMut<'a> {
    /// Wrap a serialized buffer, discovering its size class
    pub fn new(bytes: &'a mut [u8]) -> Result<Self> {
        let class = classify_checked(bytes)?;
        Ok(Self { bytes, class })
    }

    /// The discovered size class
    #[must_use]
    pub const fn class(&self) -> SizeClass {
        self.class
    }

    /// Borrow a read-only view of the same buffer
    #[must_use]
    pub fn as_view(&self) -> MessageView<'_> {
        MessageView {
            bytes: self.bytes,
            class: self.class,
        }
    }

    /// The underlying wire bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes
    }

    /// Set hop limit
    pub fn set_hop_limit(&mut self, hop_limit: u8) {
        self.bytes[0] = hop_limit;
    }

    /// Increment hop limit in place, saturating at 255
    pub fn add_hop_limit(&mut self) -> u8 {
        self.bytes[0] = self.bytes[0].saturating_add(1);
        self.bytes[0]
    }

    /// Set the earmark tag, masked to 3 bits; cfg_hdr and priority untouched
    pub fn set_earmark(&mut self, earmark: u8) {
        let (_, cfg, priority) = unpack_meta(self.bytes[1]);
        self.bytes[1] = pack_meta(earmark, cfg, priority);
    }

    /// Set priority from a defined level
    pub fn set_priority(&mut self, priority: Priority) {
        self.set_priority_raw(priority.as_u8());
    }

    /// Set priority from a raw value, masked to 3 bits
    pub fn set_priority_raw(&mut self, priority: u8) {
        let (earmark, cfg, _) = unpack_meta(self.bytes[1]);
        self.bytes[1] = pack_meta(earmark, cfg, priority & PRIORITY_MASK);
    }

    /// Set heart rate
    ///
    /// # Errors
    ///
    /// [`Error::FieldOverflow`] when the value exceeds the micro field width.
    pub fn set_heart_rate(&mut self, heart_rate: u16) -> Result<()> {
        match self.class {
            SizeClass::Full => {
                self.bytes[2..4].copy_from_slice(&heart_rate.to_be_bytes());
            }
            SizeClass::Micro => {
                self.bytes[2] = narrow("heart_rate", u64::from(heart_rate))?;
            }
        }
        Ok(())
    }

    /// Set source node identifier
    pub fn set_src(&mut self, src_id: u32) -> Result<()> {
        match self.class {
            SizeClass::Full => {
                self.bytes[4..8].copy_from_slice(&src_id.to_be_bytes());
            }
            SizeClass::Micro => {
                self.bytes[3] = narrow("src_id", u64::from(src_id))?;
            }
        }
        Ok(())
    }

    /// Set destination node identifier
    pub fn set_dst(&mut self, dst_id: u32) -> Result<()> {
        match self.class {
            SizeClass::Full => {
                self.bytes[8..12].copy_from_slice(&dst_id.to_be_bytes());
            }
            SizeClass::Micro => {
                self.bytes[4] = narrow("dst_id", u64::from(dst_id))?;
            }
        }
        Ok(())
    }

    /// Set declared payload length
    pub fn set_len(&mut self, len: u16) -> Result<()> {
        match self.class {
            SizeClass::Full => {
                self.bytes[12..14].copy_from_slice(&len.to_be_bytes());
            }
            SizeClass::Micro => {
                self.bytes[5] = narrow("len", u64::from(len))?;
            }
        }
        Ok(())
    }

    /// Write the checksum, split into its high and low wire bytes
    pub fn set_checksum(&mut self, check_sum: u16) {
        let offset = self.class.checksum_offset();
        self.bytes[offset..offset + 2].copy_from_slice(&check_sum.to_be_bytes());
    }

    /// Recompute the checksum over the current bytes and embed it
    ///
    /// The checksummed region is header + declared `len`, so trailing
    /// transport padding does not leak into the stamp and a restamped frame
    /// always loads back cleanly.
    ///
    /// # Errors
    ///
    /// [`Error::TruncatedBlock`] when the buffer holds fewer payload bytes
    /// than the header declares.
    pub fn restamp_checksum(&mut self) -> Result<u16> {
        let region = checksum::checked_region(self.bytes, self.class)?;
        let sum = checksum::compute(region, self.class);
        self.set_checksum(sum);
        Ok(sum)
    }
}

fn narrow(field: &'static str, value: u64) -> Result<u8> {
    let max = SizeClass::Micro.field_max();
    if value > max {
        return Err(Error::FieldOverflow { field, value, max });
    }
    Ok(value as u8)
}
