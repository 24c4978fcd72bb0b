//! # Scratch Pool
//!
//! Recycles large per-chunk buffers between generation calls.

use parking_lot::Mutex;

/// A bounded free list of reusable scratch objects.
///
/// A caller takes an object out, owns it exclusively for the duration of
/// one chunk call, then gives it back. Objects are never shared while
/// checked out, so no two chunk threads ever touch the same buffer.
///
/// # Thread Safety
///
/// Only the free list is locked; the lock is held for a push or a pop,
/// never while the object is in use.
///
/// # Example
///
/// ```rust
/// use strata_core::ScratchPool;
///
/// let pool: ScratchPool<Vec<u8>> = ScratchPool::new(4);
///
/// let mut buf = pool.take_or_else(|| vec![0; 1024]);
/// buf[0] = 7;
/// pool.give_back(buf);
///
/// // Same allocation comes back out
/// assert_eq!(pool.take_or_else(Vec::new)[0], 7);
/// ```
#[derive(Debug)]
pub struct ScratchPool<T> {
    /// Idle objects, most recently returned last.
    idle: Mutex<Vec<T>>,
    /// Maximum number of idle objects retained.
    capacity: usize,
}

impl<T> ScratchPool<T> {
    /// Creates a pool that retains at most `capacity` idle objects.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns the maximum number of idle objects retained.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of objects currently waiting for reuse.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Takes an idle object, or builds a fresh one when none is idle.
    pub fn take_or_else(&self, make: impl FnOnce() -> T) -> T {
        let recycled = self.idle.lock().pop();
        recycled.unwrap_or_else(make)
    }

    /// Returns an object for reuse.
    ///
    /// When the pool is already full the object is dropped.
    pub fn give_back(&self, value: T) {
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(value);
        }
    }

    /// Drops every idle object.
    pub fn clear(&self) {
        self.idle.lock().clear();
    }
}
