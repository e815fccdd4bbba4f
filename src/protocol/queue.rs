//! Buffer queues
//!
//! The wire-level buffer carries no queue links of its own; pending-send and
//! pending-process lists are expressed by [`MessageQueue`], a slab-backed
//! doubly linked list that owns its buffers and links them by index. Handles
//! are generation-checked so a stale handle can never reach a recycled slot.
//!
//! A queue is a single mutual-exclusion domain: it is `Send` but not
//! internally synchronized, so concurrent callers must serialize access
//! themselves.

use tracing::trace;

use super::MessageBuffer;

/// Position of a buffer inside a [`MessageQueue`]
///
/// Non-owning: dropping a handle does nothing, and a handle whose buffer has
/// already been removed is simply stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueHandle {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Entry {
    buffer: MessageBuffer,
    next: Option<usize>,
    prev: Option<usize>,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: Option<Entry>,
}

/// FIFO queue of message buffers with O(1) mid-queue removal
#[derive(Debug, Default)]
pub struct MessageQueue {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl MessageQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued buffers
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is queued
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Link a buffer at the tail, taking ownership
    pub fn push_back(&mut self, buffer: MessageBuffer) -> QueueHandle {
        let entry = Entry {
            buffer,
            next: None,
            prev: self.tail,
        };

        let index = if let Some(index) = self.free.pop() {
            self.slots[index].entry = Some(entry);
            index
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            self.slots.len() - 1
        };

        match self.tail {
            Some(tail) => {
                if let Some(e) = self.slots[tail].entry.as_mut() {
                    e.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        trace!(index, len = self.len, "queued message buffer");
        QueueHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Detach and return the buffer at the head
    pub fn pop_front(&mut self) -> Option<MessageBuffer> {
        let head = self.head?;
        let generation = self.slots[head].generation;
        self.remove(QueueHandle {
            index: head,
            generation,
        })
    }

    /// Borrow the buffer at the head without detaching it
    #[must_use]
    pub fn front(&self) -> Option<&MessageBuffer> {
        self.head
            .and_then(|i| self.slots[i].entry.as_ref())
            .map(|e| &e.buffer)
    }

    /// Borrow the buffer behind a handle, if still queued
    #[must_use]
    pub fn get(&self, handle: QueueHandle) -> Option<&MessageBuffer> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref().map(|e| &e.buffer)
    }

    /// Unlink a buffer from anywhere in the queue and hand it back
    ///
    /// Returns `None` for a stale handle. The entry is fully unlinked before
    /// the buffer leaves the queue, so removal is safe regardless of
    /// position.
    pub fn remove(&mut self, handle: QueueHandle) -> Option<MessageBuffer> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation += 1;

        match entry.prev {
            Some(prev) => {
                if let Some(e) = self.slots[prev].entry.as_mut() {
                    e.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(e) = self.slots[next].entry.as_mut() {
                    e.prev = entry.prev;
                }
            }
            None => self.tail = entry.prev,
        }

        self.free.push(handle.index);
        self.len -= 1;
        trace!(index = handle.index, len = self.len, "dequeued message buffer");
        Some(entry.buffer)
    }

    /// Iterate queued buffers from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &MessageBuffer> {
        QueueIter {
            queue: self,
            cursor: self.head,
        }
    }
}

struct QueueIter<'a> {
    queue: &'a MessageQueue,
    cursor: Option<usize>,
}

impl<'a> Iterator for QueueIter<'a> {
    type Item = &'a MessageBuffer;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let entry = self.queue.slots[index].entry.as_ref()?;
        self.cursor = entry.next;
        Some(&entry.buffer)
    }
}
