//! Size-class scratch-buffer pools
//!
//! Encode scratch space is drawn from one pool per size class rather than a
//! general allocator, which bounds fragmentation on constrained targets.
//! A [`PooledBuf`] returns its storage to the pool on drop; the pool never
//! holds more than its configured capacity, so bursts degrade to plain
//! allocation instead of growing the pool.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use tracing::trace;

use super::SizeClass;

/// Initial capacity for a full-class scratch buffer (header + typical MTU)
const FULL_SCRATCH_CAPACITY: usize = super::FULL_HEADER_SIZE + 1500;

/// Initial capacity for a micro-class scratch buffer (header + max payload)
const MICRO_SCRATCH_CAPACITY: usize = super::MICRO_HEADER_SIZE + u8::MAX as usize;

/// A pool of reusable encode buffers for one size class
#[derive(Debug)]
pub struct BufferPool {
    class: SizeClass,
    capacity: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create a pool holding at most `capacity` idle buffers
    #[must_use]
    pub fn new(class: SizeClass, capacity: usize) -> Self {
        Self {
            class,
            capacity,
            free: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// The pool's size class
    #[must_use]
    pub const fn class(&self) -> SizeClass {
        self.class
    }

    /// Number of idle buffers currently held
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Take a cleared buffer from the pool, allocating one when empty
    pub fn acquire(&self) -> PooledBuf<'_> {
        let reused = self.free.lock().ok().and_then(|mut free| free.pop());
        let buf = reused.unwrap_or_else(|| {
            trace!(class = %self.class, "pool empty, allocating scratch buffer");
            Vec::with_capacity(self.scratch_capacity())
        });
        PooledBuf { pool: self, buf }
    }

    fn scratch_capacity(&self) -> usize {
        match self.class {
            SizeClass::Full => FULL_SCRATCH_CAPACITY,
            SizeClass::Micro => MICRO_SCRATCH_CAPACITY,
        }
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.capacity {
                free.push(buf);
            }
            // over capacity: drop the buffer and let the allocator have it
        }
    }
}

/// An empty scratch buffer borrowed from a [`BufferPool`]
///
/// Dereferences to `Vec<u8>`; storage goes back to the pool on drop.
#[derive(Debug)]
pub struct PooledBuf<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl PooledBuf<'_> {
    /// Detach the buffer from the pool, keeping the bytes
    #[must_use]
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Deref for PooledBuf<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        // capacity 0 means into_inner already took the storage
        if self.buf.capacity() == 0 {
            return;
        }
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
