//! Aliased backing storage for plain vectors.
//!
//! Multiple vector views intentionally share one buffer: an access pattern
//! is a cheap re-indexing of the same storage, and a write through any view
//! must be observed by every other view. [`SharedStorage`] is the single
//! place this aliasing is implemented; every `unsafe` block in the crate
//! lives here.
//!
//! # Safety model
//!
//! There is no lock. Concurrent writers must partition the index space —
//! exactly what the parallel executors do, splitting `[0, size)` into
//! disjoint batches. Concurrent writes to overlapping views are undefined
//! behavior by contract, as are structural mutations (`resize`) while any
//! other thread touches the buffer. This mirrors the aliasing rules of the
//! protocol runtime, which never hands the same index to two workers.

use std::cell::UnsafeCell;
use std::sync::Arc;

/// A reference-counted, interior-mutable element buffer.
pub(crate) struct SharedStorage<T> {
    cell: Arc<UnsafeCell<Vec<T>>>,
}

// SAFETY: access is partitioned by index by callers (see module docs);
// `T` itself crosses threads only when it is `Send`.
unsafe impl<T: Send> Send for SharedStorage<T> {}
unsafe impl<T: Send + Sync> Sync for SharedStorage<T> {}

impl<T> Clone for SharedStorage<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Copy + Default> SharedStorage<T> {
    pub(crate) fn new(data: Vec<T>) -> Self {
        Self {
            cell: Arc::new(UnsafeCell::new(data)),
        }
    }

    pub(crate) fn zeroed(len: usize) -> Self {
        Self::new(vec![T::default(); len])
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        // SAFETY: shared read of the length; structural mutation is
        // single-threaded by contract.
        unsafe { (*self.cell.get()).len() }
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> T {
        // SAFETY: in-bounds read (checked); data races excluded by the
        // index-partitioning contract.
        unsafe {
            let v = &*self.cell.get();
            v[index]
        }
    }

    #[inline]
    pub(crate) fn set(&self, index: usize, value: T) {
        // SAFETY: in-bounds write (checked); data races excluded by the
        // index-partitioning contract.
        unsafe {
            let v = &mut *self.cell.get();
            v[index] = value;
        }
    }

    /// Grow or shrink the buffer, zero-filling new elements.
    ///
    /// Must not run concurrently with any other access to this buffer.
    pub(crate) fn resize(&self, len: usize) {
        // SAFETY: structural mutation; single-threaded by contract.
        unsafe {
            (&mut *self.cell.get()).resize(len, T::default());
        }
    }

    /// Snapshot the buffer into an owned `Vec`.
    pub(crate) fn to_vec(&self) -> Vec<T> {
        // SAFETY: shared read; no concurrent structural mutation.
        unsafe { (*self.cell.get()).clone() }
    }
}
