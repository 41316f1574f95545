//! Fixed-capacity pool of reusable message buffers
//!
//! All buffers are allocated once, on first use, and then cycle between the
//! free list, producer threads, the spew queue and the consumer. The pool
//! never grows: running out of buffers is an expected steady state that
//! producers answer by dropping messages, never by waiting.
//!
//! The free list and the spew queue live behind one shared mutex
//! ([`PoolLists`]); critical sections are limited to moving buffers between
//! lists, never I/O.

use super::buffer::{Buffer, BufferId};
use parking_lot::{Mutex, Once};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// State guarded by the single pool lock.
pub(crate) struct PoolLists {
    /// LIFO stack; the last element is the head.
    pub(crate) free: Vec<Buffer>,
    /// Filled buffers in publication order.
    pub(crate) spew: VecDeque<Buffer>,
    pub(crate) shutdown_requested: bool,
}

pub(crate) type SharedLists = Arc<Mutex<PoolLists>>;

pub struct BufferPool {
    lists: SharedLists,
    buffer_size: usize,
    buffer_count: usize,
    populated: Once,
}

impl BufferPool {
    /// Create an empty pool; buffers are allocated by [`ensure_populated`].
    ///
    /// [`ensure_populated`]: BufferPool::ensure_populated
    pub fn new(buffer_size: usize, buffer_count: usize) -> Self {
        assert!(buffer_size >= 2, "buffer_size must be >= 2");
        assert!(buffer_count > 0, "buffer_count must be > 0");
        Self {
            lists: Arc::new(Mutex::new(PoolLists {
                free: Vec::with_capacity(buffer_count),
                spew: VecDeque::with_capacity(buffer_count),
                shutdown_requested: false,
            })),
            buffer_size,
            buffer_count,
            populated: Once::new(),
        }
    }

    /// Build the free list exactly once, however many threads race here.
    pub fn ensure_populated(&self) {
        self.populated.call_once(|| {
            let mut lists = self.lists.lock();
            // Highest id ends up on top, so it is handed out first.
            for i in 1..=self.buffer_count {
                lists
                    .free
                    .push(Buffer::new(BufferId(i as u32), self.buffer_size));
            }
        });
    }

    /// Pop the head of the free list. Never blocks beyond the list lock,
    /// never allocates.
    pub fn acquire(&self) -> Option<Buffer> {
        self.lists.lock().free.pop()
    }

    /// Clear `buffer` and push it back onto the head of the free list.
    pub fn release(&self, mut buffer: Buffer) {
        debug_assert_eq!(buffer.capacity(), self.buffer_size);
        buffer.clear();
        self.lists.lock().free.push(buffer);
    }

    /// Return a whole batch under one lock acquisition.
    pub(crate) fn release_all(&self, buffers: Vec<Buffer>) {
        if buffers.is_empty() {
            return;
        }
        let mut lists = self.lists.lock();
        for mut buffer in buffers {
            buffer.clear();
            lists.free.push(buffer);
        }
    }

    /// Number of buffers the pool owns.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer_count
    }

    /// Size of each buffer in bytes, reserved newline byte included.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers currently on the free list.
    pub fn free_count(&self) -> usize {
        self.lists.lock().free.len()
    }

    /// Diagnostic view of which buffers are where. Not for the hot path.
    pub fn snapshot(&self) -> PoolSnapshot {
        let lists = self.lists.lock();
        PoolSnapshot {
            capacity: self.buffer_count,
            free: lists.free.iter().rev().map(Buffer::id).collect(),
            queued: lists.spew.iter().map(Buffer::id).collect(),
        }
    }

    pub(crate) fn lists(&self) -> &SharedLists {
        &self.lists
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("buffer_count", &self.buffer_count)
            .finish()
    }
}

/// Point-in-time contents of the free list and the spew queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub capacity: usize,
    /// Free buffers, head (next to be acquired) first.
    pub free: Vec<BufferId>,
    /// Queued buffers, oldest first.
    pub queued: Vec<BufferId>,
}

impl PoolSnapshot {
    /// Buffers held by producer threads or by the consumer's current batch.
    pub fn in_use(&self) -> usize {
        self.capacity - self.free.len() - self.queued.len()
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.free {
            writeln!(f, "FreeList buffer {}", id)?;
        }
        for id in &self.queued {
            writeln!(f, "SpewQueue buffer {}", id)?;
        }
        write!(f, "InUse buffers {}", self.in_use())
    }
}
