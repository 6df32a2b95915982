//! Reusable memory blocks.
//!
//! Every read cycle and every encoded frame needs a scratch block. Blocks of
//! [`STANDARD_SIZE`] are recycled through a lock-free free list; anything
//! larger is a one-off allocation and never enters the pool.

mod block;

pub use block::Buffer;

use crossbeam_queue::SegQueue;

/// 8192
pub const STANDARD_SIZE: usize = 8192;

/// Lazily populated pool of standard-size blocks.
///
/// The pool has no upper bound: it holds at most as many blocks as have been
/// alive at the same time. `acquire` and `release` never block.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: SegQueue<Buffer>,
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new() -> Self { Self { free: SegQueue::new() } }

    /// Take a standard-size block, allocating one if the pool is empty.
    /// The returned block has both cursors reset.
    #[inline]
    pub fn acquire(&self) -> Buffer {
        match self.free.pop() {
            Some(mut buf) => {
                buf.reset();
                buf
            }
            None => Buffer::with_capacity(STANDARD_SIZE),
        }
    }

    /// Give a block back. Blocks with a non-standard capacity are dropped.
    #[inline]
    pub fn release(&self, buf: Buffer) {
        if buf.capacity() == STANDARD_SIZE {
            self.free.push(buf);
        }
    }

    /// Take a block which can hold at least `n` bytes.
    /// Requests above [`STANDARD_SIZE`] bypass the pool.
    #[inline]
    pub fn allocate(&self, n: usize) -> Buffer {
        if n <= STANDARD_SIZE {
            self.acquire()
        } else {
            Buffer::with_capacity(n)
        }
    }

    /// Number of idle blocks.
    #[inline]
    pub fn idle(&self) -> usize { self.free.len() }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reuse_released_block() {
        let pool = BufferPool::new();

        let mut buf = pool.acquire();
        assert_eq!(buf.capacity(), STANDARD_SIZE);
        buf.put(b"dirty");
        let ptr = buf.as_ptr();
        pool.release(buf);
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert_eq!(buf.as_ptr(), ptr);
        assert!(buf.is_empty());
        assert_eq!(buf.wr_pos(), 0);
    }

    #[test]
    fn reject_foreign_block() {
        let pool = BufferPool::new();

        let big = pool.allocate(10000);
        assert_eq!(big.capacity(), 10000);
        pool.release(big);
        pool.release(Buffer::with_capacity(16));
        assert_eq!(pool.idle(), 0);

        let buf = pool.acquire();
        assert_eq!(buf.capacity(), STANDARD_SIZE);
    }

    #[test]
    fn allocate_small() {
        let pool = BufferPool::new();
        for n in [0, 1, 125, STANDARD_SIZE] {
            assert_eq!(pool.allocate(n).capacity(), STANDARD_SIZE);
        }
        assert_eq!(pool.allocate(STANDARD_SIZE + 1).capacity(), STANDARD_SIZE + 1);
    }

    #[test]
    fn concurrent_acquire_release() {
        let pool = Arc::new(BufferPool::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let buf = pool.acquire();
                        assert!(buf.is_empty());
                        pool.release(buf);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // never more blocks than concurrent holders
        assert!(pool.idle() <= 8);
    }
}
