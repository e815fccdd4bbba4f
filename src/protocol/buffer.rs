//! Message buffers
//!
//! A [`MessageBuffer`] is the top-level unit: a creation/arrival timestamp,
//! one header, and one owned block chain, bound to a size class at
//! construction time. [`MessageBuffer::dump`] composes the header codec,
//! chain serializer, and checksum engine into one full encode;
//! [`MessageBuffer::load`] is the all-or-nothing inverse.

use std::time::SystemTime;

use bytes::Bytes;
use tracing::trace;

use super::{Block, BlockChain, Error, Header, Result, SizeClass, checksum};

/// A mesh message: timestamp + header + block chain
///
/// The buffer exclusively owns its header and chain; dropping it releases
/// both. Queue membership is handled externally by
/// [`MessageQueue`](super::MessageQueue) rather than by links on the buffer
/// itself.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    timestamp: SystemTime,
    class: SizeClass,
    header: Header,
    chain: BlockChain,
}

impl MessageBuffer {
    /// Create an empty buffer of the given size class, stamped with the
    /// current time
    #[must_use]
    pub fn new(class: SizeClass) -> Self {
        Self {
            timestamp: SystemTime::now(),
            class,
            header: Header::new(),
            chain: BlockChain::new(),
        }
    }

    /// The buffer's size class
    #[must_use]
    pub const fn class(&self) -> SizeClass {
        self.class
    }

    /// Creation time (outbound) or arrival time (inbound)
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Get the header
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Get the header for mutation
    ///
    /// `len` and `check_sum` are recomputed at [`MessageBuffer::dump`] time,
    /// so writes to those two fields do not survive an encode.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Iterate payload blocks in append order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.chain.iter()
    }

    /// Get the owned block chain
    #[must_use]
    pub const fn chain(&self) -> &BlockChain {
        &self.chain
    }

    /// Append a payload block, keeping the header's `len` in sync
    ///
    /// # Errors
    ///
    /// [`Error::FieldOverflow`] when the block's type or length, or the
    /// chain total, no longer fits the buffer's size class. The chain is
    /// left unchanged on failure.
    pub fn push_block(&mut self, block_type: u16, data: impl Into<Bytes>) -> Result<()> {
        let mut chain = self.chain.clone();
        chain.push(block_type, data);
        let len = chain.wire_len(self.class)?;

        self.chain = chain;
        self.header.set_len(len);
        Ok(())
    }

    /// Serialize to wire bytes: header + chain, checksum stamped last
    pub fn dump(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.dump_into(&mut out)?;
        Ok(out)
    }

    /// Serialize to wire bytes, appending to `out`
    ///
    /// The embedded checksum is correct for the bytes as written; any later
    /// accessor-level mutation invalidates it until restamped.
    pub fn dump_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();

        let mut header = self.header;
        header.set_len(self.chain.wire_len(self.class)?);
        header.set_checksum(0);
        header.encode_into(self.class, out)?;
        self.chain.serialize_into(self.class, out)?;

        let sum = checksum::compute(&out[start..], self.class);
        let offset = start + self.class.checksum_offset();
        out[offset..offset + 2].copy_from_slice(&sum.to_be_bytes());

        trace!(
            class = %self.class,
            len = header.len(),
            blocks = self.chain.len(),
            checksum = sum,
            "encoded message buffer"
        );
        Ok(())
    }

    /// Rebuild a buffer from wire bytes
    ///
    /// All-or-nothing: the checksum is verified and the whole chain decoded
    /// before anything is returned. Trailing bytes past the declared total
    /// are ignored (transports may pad frames).
    ///
    /// # Errors
    ///
    /// [`Error::MalformedHeader`], [`Error::TruncatedBlock`], or
    /// [`Error::ChecksumMismatch`] depending on which stage fails.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let (header, class) = Header::decode(bytes)?;

        let header_size = class.header_size();
        let total = header_size + header.len() as usize;
        if bytes.len() < total {
            return Err(Error::TruncatedBlock {
                claimed: header.len() as usize,
                remaining: bytes.len() - header_size,
            });
        }

        let wire = &bytes[..total];
        checksum::verify(wire)?;
        let chain = BlockChain::deserialize(&wire[header_size..], class)?;

        trace!(
            class = %class,
            len = header.len(),
            blocks = chain.len(),
            "decoded message buffer"
        );

        Ok(Self {
            timestamp: SystemTime::now(),
            class,
            header,
            chain,
        })
    }
}
