//! Payload block chains
//!
//! A message body is a forward-only chain of typed, length-prefixed blocks,
//! serialized in append order. Full mode writes a 6-byte sub-header per
//! block (`next` offset + type + len) so blocks can be relocated
//! independently; micro mode packs 2-byte sub-headers contiguously and
//! derives the next block position from the cumulative length.

use bytes::Bytes;

use super::{
    BLOCK_CHAIN_END, Error, FULL_BLOCK_HEADER_SIZE, MICRO_BLOCK_HEADER_SIZE, Result, SizeClass,
};

/// One typed payload block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    block_type: u16,
    data: Bytes,
}

impl Block {
    /// Create a block from a type tag and payload bytes
    pub fn new(block_type: u16, data: impl Into<Bytes>) -> Self {
        Self {
            block_type,
            data: data.into(),
        }
    }

    /// Get the 16-bit type tag
    #[must_use]
    pub const fn block_type(&self) -> u16 {
        self.block_type
    }

    /// Get the payload byte length
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the block carries no data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the payload bytes
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }
}

/// An owned, ordered chain of payload blocks
///
/// Blocks are processed in the order they were appended; the first block is
/// the message's primary content. A chain belongs to exactly one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockChain {
    blocks: Vec<Block>,
}

impl BlockChain {
    /// Create an empty chain
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Append a block at the tail
    pub fn push(&mut self, block_type: u16, data: impl Into<Bytes>) {
        self.blocks.push(Block::new(block_type, data));
    }

    /// Number of blocks in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when the chain holds no blocks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate blocks in append order
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Serialized size of the chain in the given class
    ///
    /// # Errors
    ///
    /// [`Error::FieldOverflow`] when a block's type, a block's length, or the
    /// chain total exceeds what the class's fields can carry.
    pub fn wire_len(&self, class: SizeClass) -> Result<u16> {
        let mut total: u64 = 0;
        for block in &self.blocks {
            if u64::from(block.block_type) > class.field_max() {
                return Err(Error::FieldOverflow {
                    field: "block.type",
                    value: u64::from(block.block_type),
                    max: class.field_max(),
                });
            }
            if block.data.len() as u64 > class.field_max() {
                return Err(Error::FieldOverflow {
                    field: "block.len",
                    value: block.data.len() as u64,
                    max: class.field_max(),
                });
            }
            total += (class.block_header_size() + block.data.len()) as u64;
        }

        // The header's len field must be able to describe the whole chain.
        if total > class.field_max() {
            return Err(Error::FieldOverflow {
                field: "len",
                value: total,
                max: class.field_max(),
            });
        }

        Ok(total as u16)
    }

    /// Serialize the chain into `out`, appending `wire_len` bytes
    pub fn serialize_into(&self, class: SizeClass, out: &mut Vec<u8>) -> Result<()> {
        // Validates widths up front so nothing is written on failure.
        let total = self.wire_len(class)?;
        out.reserve(total as usize);

        match class {
            SizeClass::Full => {
                let mut cursor = 0usize;
                for (i, block) in self.blocks.iter().enumerate() {
                    let end = cursor + FULL_BLOCK_HEADER_SIZE + block.data.len();
                    let next = if i + 1 == self.blocks.len() {
                        BLOCK_CHAIN_END
                    } else {
                        end as u16
                    };
                    out.extend_from_slice(&next.to_be_bytes());
                    out.extend_from_slice(&block.block_type.to_be_bytes());
                    out.extend_from_slice(&(block.data.len() as u16).to_be_bytes());
                    out.extend_from_slice(&block.data);
                    cursor = end;
                }
            }
            SizeClass::Micro => {
                for block in &self.blocks {
                    out.push(block.block_type as u8);
                    out.push(block.data.len() as u8);
                    out.extend_from_slice(&block.data);
                }
            }
        }

        Ok(())
    }

    /// Rebuild a chain from a serialized payload region
    ///
    /// # Errors
    ///
    /// [`Error::TruncatedBlock`] when a sub-header claims more bytes than
    /// remain, or a full-mode `next` offset fails to move strictly forward
    /// within the region.
    pub fn deserialize(bytes: &[u8], class: SizeClass) -> Result<Self> {
        match class {
            SizeClass::Full => Self::deserialize_full(bytes),
            SizeClass::Micro => Self::deserialize_micro(bytes),
        }
    }

    fn deserialize_full(bytes: &[u8]) -> Result<Self> {
        let mut chain = Self::new();
        let mut cursor = 0usize;

        while cursor < bytes.len() {
            let remaining = bytes.len() - cursor;
            if remaining < FULL_BLOCK_HEADER_SIZE {
                return Err(Error::TruncatedBlock {
                    claimed: FULL_BLOCK_HEADER_SIZE,
                    remaining,
                });
            }

            let next = u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]);
            let block_type = u16::from_be_bytes([bytes[cursor + 2], bytes[cursor + 3]]);
            let len = u16::from_be_bytes([bytes[cursor + 4], bytes[cursor + 5]]) as usize;

            let data_start = cursor + FULL_BLOCK_HEADER_SIZE;
            let data_end = data_start + len;
            if data_end > bytes.len() {
                return Err(Error::TruncatedBlock {
                    claimed: len,
                    remaining: bytes.len() - data_start,
                });
            }

            chain
                .blocks
                .push(Block::new(block_type, bytes[data_start..data_end].to_vec()));

            if next == BLOCK_CHAIN_END {
                break;
            }

            // Offsets must move strictly forward past this block's data.
            let next = next as usize;
            if next < data_end || next >= bytes.len() {
                return Err(Error::TruncatedBlock {
                    claimed: next,
                    remaining: bytes.len() - data_end,
                });
            }
            cursor = next;
        }

        Ok(chain)
    }

    fn deserialize_micro(bytes: &[u8]) -> Result<Self> {
        let mut chain = Self::new();
        let mut cursor = 0usize;

        while cursor < bytes.len() {
            let remaining = bytes.len() - cursor;
            if remaining < MICRO_BLOCK_HEADER_SIZE {
                return Err(Error::TruncatedBlock {
                    claimed: MICRO_BLOCK_HEADER_SIZE,
                    remaining,
                });
            }

            let block_type = u16::from(bytes[cursor]);
            let len = bytes[cursor + 1] as usize;

            let data_start = cursor + MICRO_BLOCK_HEADER_SIZE;
            let data_end = data_start + len;
            if data_end > bytes.len() {
                return Err(Error::TruncatedBlock {
                    claimed: len,
                    remaining: bytes.len() - data_start,
                });
            }

            chain
                .blocks
                .push(Block::new(block_type, bytes[data_start..data_end].to_vec()));
            cursor = data_end;
        }

        Ok(chain)
    }
}

impl<'a> IntoIterator for &'a BlockChain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
