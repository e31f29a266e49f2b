//! Shared numeric buffers
//!
//! A [`Storage`] is a flat `f64` buffer that any number of vector and matrix
//! views can address at once. Cloning a `Storage` clones the handle, not the
//! values: every clone sees every write.
//!
//! # Aliasing contract
//!
//! Views over the same storage alias on purpose. A `set` through one view is
//! visible through every other view over the same positions. Writes to one
//! buffer must be serialized by the caller; the internal lock only keeps each
//! single operation consistent.
//!
//! # Example
//!
//! ```
//! use dlinalg::{Storage, Vector};
//!
//! let storage = Storage::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
//! let mut tail = Vector::wrap(storage.clone(), 2, 2).unwrap();
//! tail.set(0, 30.0);
//!
//! assert_eq!(storage.to_vec(), vec![1.0, 2.0, 30.0, 4.0]);
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, never-resized `f64` buffer
#[derive(Clone, Default)]
pub struct Storage {
    inner: Arc<RwLock<Vec<f64>>>,
}

impl Storage {
    /// Zero-initialized buffer of `len` values
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    /// Buffer of `len` copies of `value`
    pub fn filled(len: usize, value: f64) -> Self {
        Self::from_vec(vec![value; len])
    }

    /// Take ownership of `values` without copying
    pub fn from_vec(values: Vec<f64>) -> Self {
        Storage {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    /// Number of values in the buffer
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when the buffer holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when both handles refer to the same buffer
    pub fn same_buffer(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy of the whole buffer
    pub fn to_vec(&self) -> Vec<f64> {
        self.read().clone()
    }

    /// Number of live handles (views) over this buffer
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    // The buffer holds plain values, so a panic while the lock was held
    // leaves nothing half-updated that later readers could trip on.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<f64>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<f64>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Read two buffers at once; the same buffer is locked only once
    ///
    /// Locks are taken in address order, so two threads reading and writing
    /// each other's buffers cannot deadlock.
    pub(crate) fn with_read_pair<R>(
        a: &Storage,
        b: &Storage,
        f: impl FnOnce(&[f64], &[f64]) -> R,
    ) -> R {
        if a.same_buffer(b) {
            let guard = a.read();
            return f(&guard, &guard);
        }
        if a.addr() < b.addr() {
            let ga = a.read();
            let gb = b.read();
            f(&ga, &gb)
        } else {
            let gb = b.read();
            let ga = a.read();
            f(&ga, &gb)
        }
    }

    /// Write `dest` while reading `src`
    ///
    /// `src` must be a different buffer; callers materialize the source region
    /// first when both views share one buffer.
    pub(crate) fn with_write_read<R>(
        dest: &Storage,
        src: &Storage,
        f: impl FnOnce(&mut [f64], &[f64]) -> R,
    ) -> R {
        debug_assert!(!dest.same_buffer(src));
        if dest.addr() < src.addr() {
            let mut gd = dest.write();
            let gs = src.read();
            f(&mut gd, &gs)
        } else {
            let gs = src.read();
            let mut gd = dest.write();
            f(&mut gd, &gs)
        }
    }
}

impl From<Vec<f64>> for Storage {
    fn from(values: Vec<f64>) -> Self {
        Storage::from_vec(values)
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("handles", &self.handle_count())
            .finish()
    }
}
