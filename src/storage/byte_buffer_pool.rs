//! Bounded pool of reusable fixed-size byte buffers.
//!
//! Page I/O borrows one `PAGE_SIZE` buffer per read or write. The pool caps
//! the memory spent on those buffers: once every buffer is out, callers wait
//! in FIFO order until one is returned, the pool is closed, or their
//! blocking budget runs out.
//!
//! # Waiting
//! Each waiter parks on its own [`Condvar`], queued behind a single mutex
//! that also guards the free list. A returned buffer signals only the
//! oldest waiter. The waiter leaves the queue itself, so a signal that races
//! with a timeout is never lost: whoever leaves with buffers still free
//! passes the signal on.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::common::config::{StorageConfig, PAGE_SIZE};
use crate::common::{Error, Result};

struct PoolState {
    free: VecDeque<Vec<u8>>,
    waiters: VecDeque<Arc<Condvar>>,
    closed: bool,
}

/// Thread-safe pool of `capacity` buffers of `buffer_size` bytes each.
///
/// All buffers are allocated up front and recycled; the pool never grows.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use extentdb::storage::ByteBufferPool;
///
/// let pool = ByteBufferPool::new(4096, 1024).unwrap();
/// let buf = pool.allocate(Duration::from_millis(10)).unwrap();
/// assert_eq!(buf.len(), 1024);
/// assert_eq!(pool.free_count(), 3);
/// pool.deallocate(buf).unwrap();
/// ```
pub struct ByteBufferPool {
    buffer_size: usize,
    capacity: usize,
    state: Mutex<PoolState>,
}

impl ByteBufferPool {
    /// Create a pool splitting `total_memory` into `buffer_size` chunks.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if either size is zero or `total_memory` is not
    /// a multiple of `buffer_size`.
    pub fn new(total_memory: usize, buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 || total_memory == 0 {
            return Err(Error::InvalidConfig(format!(
                "byte buffer pool needs non-zero sizes, got total {} and buffer {}",
                total_memory, buffer_size
            )));
        }
        if total_memory % buffer_size != 0 {
            return Err(Error::InvalidConfig(format!(
                "total memory {} is not a multiple of the buffer size {}",
                total_memory, buffer_size
            )));
        }

        let capacity = total_memory / buffer_size;
        let free = (0..capacity).map(|_| vec![0u8; buffer_size]).collect();
        debug!(
            "byte buffer pool: {} buffers of {} bytes",
            capacity, buffer_size
        );

        Ok(Self {
            buffer_size,
            capacity,
            state: Mutex::new(PoolState {
                free,
                waiters: VecDeque::new(),
                closed: false,
            }),
        })
    }

    /// Page-sized pool for a process allowed `total_memory` bytes overall.
    pub fn for_total_memory(total_memory: usize) -> Result<Self> {
        Self::new(StorageConfig::io_memory_for(total_memory), PAGE_SIZE)
    }

    /// Take a buffer, waiting at most `max_block` for one to be returned.
    ///
    /// A returned buffer is zero-filled.
    ///
    /// # Errors
    /// - `Error::PoolClosed` if the pool is closed before or while waiting
    /// - `Error::AllocationTimeout` if `max_block` elapses first
    pub fn allocate(&self, max_block: Duration) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::PoolClosed);
        }
        if let Some(buffer) = state.free.pop_front() {
            return Ok(buffer);
        }

        let started = Instant::now();
        // `None` when `max_block` is too large to represent: wait indefinitely.
        let deadline = started.checked_add(max_block);
        let waiter = Arc::new(Condvar::new());
        state.waiters.push_back(Arc::clone(&waiter));
        trace!("byte buffer pool exhausted, {} waiting", state.waiters.len());

        let result = loop {
            if state.closed {
                break Err(Error::PoolClosed);
            }
            if let Some(buffer) = state.free.pop_front() {
                break Ok(buffer);
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    break Err(Error::AllocationTimeout {
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Some(deadline) => {
                    waiter.wait_until(&mut state, deadline);
                }
                None => waiter.wait(&mut state),
            }
        };

        state.waiters.retain(|queued| !Arc::ptr_eq(queued, &waiter));
        if !state.free.is_empty() {
            if let Some(next) = state.waiters.front() {
                next.notify_one();
            }
        }

        if let Err(ref e) = result {
            debug!("byte buffer pool allocation failed: {}", e);
        }
        result
    }

    /// Return a buffer to the pool and wake the oldest waiter.
    ///
    /// # Errors
    /// - `Error::BufferSizeMismatch` if the buffer did not come from this pool
    /// - `Error::PoolOverflow` if every buffer is already back
    pub fn deallocate(&self, mut buffer: Vec<u8>) -> Result<()> {
        if buffer.len() != self.buffer_size {
            return Err(Error::BufferSizeMismatch {
                expected: self.buffer_size,
                actual: buffer.len(),
            });
        }
        buffer.fill(0);

        let mut state = self.state.lock();
        if state.free.len() >= self.capacity {
            return Err(Error::PoolOverflow {
                capacity: self.capacity,
            });
        }
        state.free.push_back(buffer);
        if let Some(oldest) = state.waiters.front() {
            oldest.notify_one();
        }
        Ok(())
    }

    /// Borrow a buffer for the lifetime of the returned guard.
    pub fn acquire(&self, max_block: Duration) -> Result<PooledBuffer<'_>> {
        let buffer = self.allocate(max_block)?;
        Ok(PooledBuffer {
            pool: self,
            buffer: Some(buffer),
        })
    }

    /// Fail all current and future allocations.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        for waiter in &state.waiters {
            waiter.notify_one();
        }
        debug!(
            "byte buffer pool closed with {} waiters",
            state.waiters.len()
        );
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Buffers currently available without waiting.
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Callers currently parked in `allocate`.
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Total number of buffers owned by the pool.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl std::fmt::Debug for ByteBufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("capacity", &self.capacity)
            .field("free", &self.free_count())
            .finish()
    }
}

/// A pooled buffer, returned to its pool when dropped.
pub struct PooledBuffer<'a> {
    pool: &'a ByteBufferPool,
    buffer: Option<Vec<u8>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            if let Err(e) = self.pool.deallocate(buffer) {
                warn!("failed to return pooled buffer: {}", e);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
