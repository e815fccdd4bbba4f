//! meshbuf - wire codec and buffer management for mesh-network messages
//!
//! This library implements the message representation shared by mesh nodes:
//! a bit-packed, addressed header (hop limit, priority, heart rate,
//! source/destination identifiers, checksum) followed by a chain of typed
//! payload blocks. Two size classes share one logical layout: `Full` for
//! normal links and `Micro` for constrained ones, discriminated by the
//! header's `cfg_hdr` bits so a receiver self-configures from wire data
//! alone.
//!
//! Transport, routing, and node configuration are external collaborators;
//! this crate only translates between bytes and structures.
//!
//! # Quick Start
//!
//! ```rust
//! use meshbuf::{MessageBuffer, Priority, SizeClass};
//!
//! // Build a message
//! let mut msg = MessageBuffer::new(SizeClass::Full);
//! msg.header_mut().set_src(0x01);
//! msg.header_mut().set_dst(0x02);
//! msg.header_mut().set_priority(Priority::Level2);
//! msg.push_block(0x10, b"hello mesh".as_slice())?;
//!
//! // Serialize (checksum stamped last)
//! let wire = msg.dump()?;
//!
//! // Patch one field in place without a full decode
//! let mut wire = wire;
//! let mut view = meshbuf::MessageViewMut::new(&mut wire)?;
//! view.add_hop_limit();
//! view.restamp_checksum()?;
//!
//! // Decode (all-or-nothing, checksum verified)
//! let received = MessageBuffer::load(&wire)?;
//! assert_eq!(received.header().dst_id(), 0x02);
//! # Ok::<(), meshbuf::Error>(())
//! ```
//!
//! # Features
//!
//! - **Bit-exact header packing** - explicit shift/mask logic, identical on
//!   every platform
//! - **Chained payload blocks** - typed, length-prefixed, order-preserving
//! - **Raw-buffer accessors** - read or patch one field without a
//!   decode/encode round-trip
//! - **Micro/full size classes** - one logical format, two wire footprints

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    Block, BlockChain, BufferPool, Error, FULL_HEADER_SIZE, Header, MICRO_HEADER_SIZE,
    MessageBuffer, MessageQueue, MessageView, MessageViewMut, PRIORITY_MASK, PooledBuf, Priority,
    QueueHandle, Result, SizeClass, is_micro,
};
