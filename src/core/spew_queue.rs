//! Multi-producer, single-consumer hand-off of filled buffers
//!
//! Producers [`publish`](SpewQueue::publish) completed lines; the consumer
//! thread waits on the queue's condition variable and detaches batches to
//! write outside the lock.
//!
//! The queue is FIFO: batches come out in the order buffers were published,
//! so lines from one producer thread reach the sink in the order that thread
//! wrote them.

use super::buffer::Buffer;
use super::buffer_pool::{BufferPool, SharedLists};
use parking_lot::Condvar;
use std::time::Duration;

pub struct SpewQueue {
    lists: SharedLists,
    wake: Condvar,
}

/// What the consumer got from one wait.
pub(crate) struct Wake {
    pub(crate) batch: Vec<Buffer>,
    pub(crate) shutdown: bool,
}

impl SpewQueue {
    /// Create a queue that shares `pool`'s lock.
    pub fn attached_to(pool: &BufferPool) -> Self {
        Self {
            lists: pool.lists().clone(),
            wake: Condvar::new(),
        }
    }

    /// Hand a filled buffer to the consumer and signal it once.
    ///
    /// Once shutdown has been requested nobody will drain the queue again,
    /// so the buffer goes straight back to the free list and `false` is
    /// returned.
    pub fn publish(&self, mut buffer: Buffer) -> bool {
        {
            let mut lists = self.lists.lock();
            if lists.shutdown_requested {
                buffer.clear();
                lists.free.push(buffer);
                return false;
            }
            lists.spew.push_back(buffer);
        }
        self.wake.notify_one();
        true
    }

    /// Detach every queued buffer, oldest first.
    pub fn drain_all(&self) -> Vec<Buffer> {
        self.lists.lock().spew.drain(..).collect()
    }

    /// Detach at most `max` of the oldest queued buffers.
    pub fn drain_up_to(&self, max: usize) -> Vec<Buffer> {
        let mut lists = self.lists.lock();
        let n = lists.spew.len().min(max);
        lists.spew.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.lists.lock().spew.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.lock().spew.is_empty()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.lists.lock().shutdown_requested
    }

    /// Set the shutdown flag and wake the consumer.
    pub(crate) fn request_shutdown(&self) {
        self.lists.lock().shutdown_requested = true;
        self.wake.notify_all();
    }

    /// Block until there is work, shutdown is requested, or `interval`
    /// elapses, then detach up to `max` buffers.
    pub(crate) fn wait_for_work(&self, max: usize, interval: Duration) -> Wake {
        let mut lists = self.lists.lock();
        if lists.spew.is_empty() && !lists.shutdown_requested {
            // Timeouts and spurious wake-ups both just yield an empty batch.
            let _ = self.wake.wait_for(&mut lists, interval);
        }
        let n = lists.spew.len().min(max);
        Wake {
            batch: lists.spew.drain(..n).collect(),
            shutdown: lists.shutdown_requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BufferId;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn filled(pool: &BufferPool, text: &str) -> Buffer {
        let mut buf = pool.acquire().expect("buffer available");
        buf.append(text.as_bytes());
        buf
    }

    #[test]
    fn test_drain_all_is_chronological() {
        let pool = BufferPool::new(32, 3);
        pool.ensure_populated();
        let queue = SpewQueue::attached_to(&pool);

        for text in ["one", "two", "three"] {
            assert!(queue.publish(filled(&pool, text)));
        }
        assert_eq!(queue.len(), 3);

        let drained: Vec<Vec<u8>> = queue
            .drain_all()
            .iter()
            .map(|b| b.as_bytes().to_vec())
            .collect();
        assert_eq!(drained, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_up_to_leaves_remainder() {
        let pool = BufferPool::new(32, 3);
        pool.ensure_populated();
        let queue = SpewQueue::attached_to(&pool);
        for text in ["a", "b", "c"] {
            queue.publish(filled(&pool, text));
        }

        let first = queue.drain_up_to(2);
        assert_eq!(first.len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_up_to(2)[0].as_bytes(), b"c");

        pool.release_all(first);
    }

    #[test]
    fn test_publish_after_shutdown_recycles_buffer() {
        let pool = BufferPool::new(32, 2);
        pool.ensure_populated();
        let queue = SpewQueue::attached_to(&pool);

        queue.request_shutdown();
        assert!(!queue.publish(filled(&pool, "late")));
        assert!(queue.is_empty());
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.snapshot().free[0], BufferId(2));
    }

    #[test]
    fn test_wait_times_out_with_empty_batch() {
        let pool = BufferPool::new(32, 1);
        pool.ensure_populated();
        let queue = SpewQueue::attached_to(&pool);

        let started = Instant::now();
        let wake = queue.wait_for_work(10, Duration::from_millis(20));
        assert!(wake.batch.is_empty());
        assert!(!wake.shutdown);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_publish_wakes_waiter() {
        let pool = Arc::new(BufferPool::new(32, 1));
        pool.ensure_populated();
        let queue = Arc::new(SpewQueue::attached_to(&pool));

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || loop {
                let wake = queue.wait_for_work(10, Duration::from_secs(5));
                if !wake.batch.is_empty() {
                    return wake.batch.len();
                }
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.publish(filled(&pool, "ping"));
        assert_eq!(waiter.join().expect("waiter panicked"), 1);
    }

    #[test]
    fn test_shutdown_wakes_waiter() {
        let pool = BufferPool::new(32, 1);
        pool.ensure_populated();
        let queue = Arc::new(SpewQueue::attached_to(&pool));

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_for_work(10, Duration::from_secs(30)).shutdown)
        };

        thread::sleep(Duration::from_millis(20));
        queue.request_shutdown();
        assert!(waiter.join().expect("waiter panicked"));
    }
}
