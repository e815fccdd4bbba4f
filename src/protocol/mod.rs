//! Mesh message protocol core
//!
//! Wire format, header codec, block chains, checksum, and raw-byte accessors.

mod accessor;
mod block;
mod buffer;
mod checksum;
mod error;
mod header;
mod pool;
mod queue;
mod types;

pub use accessor::{MessageView, MessageViewMut, is_micro};
pub use block::{Block, BlockChain};
pub use buffer::MessageBuffer;
pub use checksum::{compute, verify};
pub use error::{Error, Result};
pub use header::Header;
pub use pool::{BufferPool, PooledBuf};
pub use queue::{MessageQueue, QueueHandle};
pub use types::{Priority, SizeClass};

pub(crate) use types::{pack_meta, unpack_meta};

/// Full-mode header size in bytes
pub const FULL_HEADER_SIZE: usize = 16;

/// Micro-mode header size in bytes
pub const MICRO_HEADER_SIZE: usize = 8;

/// Full-mode block sub-header size: next(2) + type(2) + len(2)
pub const FULL_BLOCK_HEADER_SIZE: usize = 6;

/// Micro-mode block sub-header size: type(1) + len(1)
pub const MICRO_BLOCK_HEADER_SIZE: usize = 2;

/// Mask applied to every priority read and write (3-bit field)
pub const PRIORITY_MASK: u8 = 0x7;

/// `cfg_hdr` discriminator value for full mode
pub const CFG_FULL: u8 = 0b01;

/// `cfg_hdr` discriminator value for micro mode
pub const CFG_MICRO: u8 = 0b10;

/// Full-mode sentinel in a block's `next` field marking the end of the chain
pub const BLOCK_CHAIN_END: u16 = 0xFFFF;

/// Minimum bytes needed to read the `cfg_hdr` discriminator at byte 1
pub const MIN_CLASSIFY_SIZE: usize = 2;
