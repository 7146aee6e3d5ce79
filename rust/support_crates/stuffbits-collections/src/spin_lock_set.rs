//! A fixed-size set of test-and-set spin locks packed into atomic words.

use std::sync::atomic::{AtomicU64, Ordering};

/// A fixed-capacity set of busy-wait locks, one bit per lock.
///
/// `SpinLockSet` backs the lock regions of a packed array: lock `i` is held while
/// bit `i` is set. The set is stored in a `Vec<AtomicU64>`, lock `i` living in
/// element `i / 64` at bit position `i % 64`. Acquisition is a test-and-set
/// (`fetch_or`) with `Acquire` ordering; release clears the bit with `Release`
/// ordering, so writes made while a lock is held are visible to the next holder.
///
/// ## Lock ordering
///
/// A caller that needs two locks must take them through [`lock_span`], which
/// always acquires the lower index first and releases in reverse order. Taking
/// two locks in any other order can deadlock against another thread doing the
/// same on the same pair.
///
/// [`lock_span`]: SpinLockSet::lock_span
pub struct SpinLockSet(Vec<AtomicU64>, usize);

impl SpinLockSet {
    /// Creates a new `SpinLockSet` with `size` locks, all released.
    pub fn new(size: usize) -> Self {
        let vec_len = size.div_ceil(64);
        SpinLockSet((0..vec_len).map(|_| AtomicU64::new(0)).collect(), size)
    }

    /// Returns the number of locks in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether lock `index` is currently held.
    ///
    /// The answer may be stale by the time the caller acts on it.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn is_locked(&self, index: usize) -> bool {
        assert!(index < self.len());
        let (word, mask) = self.lock_location(index);
        word.load(Ordering::Relaxed) & mask != 0
    }

    /// Attempts to take lock `index` without waiting.
    ///
    /// Returns `true` if the lock was free and is now held by the caller.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn try_lock(&self, index: usize) -> bool {
        assert!(index < self.len());
        let (word, mask) = self.lock_location(index);
        word.fetch_or(mask, Ordering::Acquire) & mask == 0
    }

    /// Spins until lock `index` is held by the caller.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn lock(&self, index: usize) {
        assert!(index < self.len());
        let (word, mask) = self.lock_location(index);
        while word.fetch_or(mask, Ordering::Acquire) & mask != 0 {
            // Wait on a plain load so the cache line is not hammered with writes.
            while word.load(Ordering::Relaxed) & mask != 0 {
                std::hint::spin_loop();
            }
        }
    }

    /// Releases lock `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`, and in debug builds if the lock was not held.
    #[inline]
    pub fn unlock(&self, index: usize) {
        assert!(index < self.len());
        let (word, mask) = self.lock_location(index);
        let prev = word.fetch_and(!mask, Ordering::Release);
        debug_assert!(prev & mask != 0, "unlock of a released lock {index}");
    }

    /// Acquires every lock in `first..=last` in ascending order and returns a
    /// guard that releases them in descending order.
    ///
    /// In practice `last` is either `first` or `first + 1`: a packed value
    /// touches at most two adjacent lock regions.
    ///
    /// # Panics
    ///
    /// Panics if `first > last` or `last >= len()`.
    pub fn lock_span(&self, first: usize, last: usize) -> SpanGuard<'_> {
        assert!(first <= last, "lock span {first}..={last} is inverted");
        assert!(last < self.len());
        for index in first..=last {
            self.lock(index);
        }
        SpanGuard {
            locks: self,
            first,
            last,
        }
    }

    fn lock_location(&self, index: usize) -> (&AtomicU64, u64) {
        (&self.0[index >> 6], 1u64 << (index & 63))
    }
}

/// Holds a contiguous, ascending range of locks from a [`SpinLockSet`].
///
/// Dropping the guard releases the locks in reverse acquisition order.
pub struct SpanGuard<'a> {
    locks: &'a SpinLockSet,
    first: usize,
    last: usize,
}

impl SpanGuard<'_> {
    /// The locks held by this guard.
    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        for index in (self.first..=self.last).rev() {
            self.locks.unlock(index);
        }
    }
}
