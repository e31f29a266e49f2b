//! Vector views over shared storage
//!
//! A [`Vector`] is a [`Storage`] handle plus a [`VectorLayout`] plus the
//! [`Backend`] that runs its kernels. Views created by [`Vector::map`],
//! [`Vector::range`] or [`Vector::view`] share the storage of their source;
//! [`Vector::copy`] materializes a view into a fresh dense buffer.
//!
//! Operations are split across submodules:
//!
//! - `arith`: unary functions, binary arithmetic, fused multiply-add, clamping
//! - `reduce`: sums, moments, extrema, dot products, norms, bilinear forms

mod arith;
mod reduce;

use std::fmt;

use crate::dispatch::{self, Kernel, Path};
use crate::error::{LinalgError, Result};
use crate::layout::VectorLayout;
use crate::matrix::Matrix;
use crate::ops::BinaryOp;
use crate::source::{Sampler, TabularSource, ValueGenerator};
use crate::storage::Storage;
use crate::Backend;

/// Vector view over a shared `f64` buffer
///
/// # Examples
///
/// ```
/// use dlinalg::Vector;
///
/// let mut a = Vector::from_slice(&[1.0, 2.0, 3.0]);
/// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
/// a.add(&b).unwrap();
///
/// assert_eq!(a.to_vec(), vec![5.0, 7.0, 9.0]);
/// ```
pub struct Vector {
    storage: Storage,
    layout: VectorLayout,
    backend: Backend,
}

impl Vector {
    pub(crate) fn from_parts(storage: Storage, layout: VectorLayout, backend: Backend) -> Self {
        Vector {
            storage,
            layout,
            backend,
        }
    }

    /// Take ownership of `values` as a dense vector
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let v = Vector::from_vec(vec![1.0, 2.0]);
    /// assert_eq!(v.len(), 2);
    /// ```
    pub fn from_vec(values: Vec<f64>) -> Self {
        let size = values.len();
        Vector::from_parts(
            Storage::from_vec(values),
            VectorLayout::Dense { offset: 0, size },
            Backend::select_best(),
        )
    }

    /// Dense copy of `values`
    pub fn from_slice(values: &[f64]) -> Self {
        Vector::from_vec(values.to_vec())
    }

    /// `len` zeros
    pub fn zeros(len: usize) -> Self {
        Vector::from_vec(vec![0.0; len])
    }

    /// `len` copies of `value`
    pub fn fill(len: usize, value: f64) -> Self {
        Vector::from_vec(vec![value; len])
    }

    /// Element `i` is `f(i)`
    pub fn from_fn(len: usize, f: impl FnMut(usize) -> f64) -> Self {
        Vector::from_vec((0..len).map(f).collect())
    }

    /// `len` standard normal values from this thread's generator
    pub fn random(len: usize) -> Self {
        Vector::random_with(len, &mut Sampler::standard_normal())
    }

    /// `len` reproducible standard normal values
    pub fn random_seeded(len: usize, seed: u64) -> Self {
        Vector::random_with(len, &mut Sampler::standard_normal_seeded(seed))
    }

    /// `len` values drawn from `generator`
    pub fn random_with(len: usize, generator: &mut impl ValueGenerator) -> Self {
        Vector::from_fn(len, |_| generator.sample_next())
    }

    /// Dense copy of column `col` of a table
    pub fn from_column(source: &impl TabularSource, col: usize) -> Result<Self> {
        if col >= source.col_count() {
            return Err(LinalgError::OutOfRangeConstruction(format!(
                "column {col} of a table with {} columns",
                source.col_count()
            )));
        }
        Ok(Vector::from_fn(source.row_count(), |row| {
            source.get_double(row, col)
        }))
    }

    /// Zero-copy dense view of `storage[offset..offset + size]`
    ///
    /// # Errors
    ///
    /// [`LinalgError::OutOfRangeConstruction`] when the region does not fit.
    pub fn wrap(storage: Storage, offset: usize, size: usize) -> Result<Self> {
        Vector::wrap_layout(storage, VectorLayout::Dense { offset, size })
    }

    /// Zero-copy view of `storage[offset + i * stride]` for `i < size`
    pub fn wrap_strided(storage: Storage, offset: usize, stride: usize, size: usize) -> Result<Self> {
        let layout = if stride == 1 {
            VectorLayout::Dense { offset, size }
        } else {
            VectorLayout::Strided {
                offset,
                stride,
                size,
            }
        };
        Vector::wrap_layout(storage, layout)
    }

    /// Zero-copy view of `storage[indices[i]]`
    ///
    /// Consecutive indices produce a dense view.
    pub fn wrap_mapped(storage: Storage, indices: &[usize]) -> Result<Self> {
        let whole = VectorLayout::Dense {
            offset: 0,
            size: storage.len(),
        };
        let layout = whole.map(indices)?;
        Vector::wrap_layout(storage, layout)
    }

    fn wrap_layout(storage: Storage, layout: VectorLayout) -> Result<Self> {
        layout.validate(storage.len())?;
        Ok(Vector::from_parts(storage, layout, Backend::select_best()))
    }

    /// Run this vector's kernels on `backend`
    ///
    /// # Errors
    ///
    /// [`LinalgError::UnsupportedBackend`] when the CPU lacks the features.
    pub fn with_backend(mut self, backend: Backend) -> Result<Self> {
        if !backend.is_available() {
            return Err(LinalgError::UnsupportedBackend(backend));
        }
        self.backend = backend.resolve();
        Ok(self)
    }

    /// Backend running this vector's kernels
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Addressing of this view
    pub fn layout(&self) -> &VectorLayout {
        &self.layout
    }

    /// Backing buffer handle
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// True when the vector has no elements
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// True when both vectors address the same backing buffer
    pub fn shares_storage(&self, other: &Vector) -> bool {
        self.storage.same_buffer(&other.storage)
    }

    /// Element `i`
    ///
    /// # Panics
    ///
    /// When `i` is outside the view or its position is outside the buffer.
    pub fn get(&self, i: usize) -> f64 {
        self.storage.read()[self.layout.position(i)]
    }

    /// Overwrite element `i`; visible through every view of the same position
    pub fn set(&mut self, i: usize, value: f64) {
        let pos = self.layout.position(i);
        self.storage.write()[pos] = value;
    }

    /// Add `delta` to element `i`
    pub fn inc(&mut self, i: usize, delta: f64) {
        let pos = self.layout.position(i);
        self.storage.write()[pos] += delta;
    }

    /// Second handle over the same elements
    pub fn view(&self) -> Vector {
        Vector::from_parts(self.storage.clone(), self.layout.clone(), self.backend)
    }

    /// View of the elements at `indices`, in that order
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let v = Vector::from_slice(&[10.0, 20.0, 30.0]);
    /// let mut picked = v.map(&[2, 0]).unwrap();
    /// picked.set(1, 11.0);
    ///
    /// assert_eq!(v.to_vec(), vec![11.0, 20.0, 30.0]);
    /// ```
    pub fn map(&self, indices: &[usize]) -> Result<Vector> {
        let layout = self.layout.map(indices)?;
        Ok(Vector::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// View of the elements in `[start, end)`
    pub fn range(&self, start: usize, end: usize) -> Result<Vector> {
        let layout = self.layout.range(start, end)?;
        Ok(Vector::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// Dense copy of the elements at `indices`
    pub fn map_copy(&self, indices: &[usize]) -> Result<Vector> {
        Ok(self.map(indices)?.copy())
    }

    /// Copy the elements at `indices` into `to`, in that order
    ///
    /// # Errors
    ///
    /// [`LinalgError::OutOfRangeConstruction`] for an index outside the view,
    /// [`LinalgError::DimensionMismatch`] unless `to.len() == indices.len()`.
    /// Nothing is written on error.
    pub fn map_to(&self, indices: &[usize], to: &mut Vector) -> Result<()> {
        let selected = self.map(indices)?;
        to.copy_from(&selected)
    }

    /// Sort the elements in place by [`f64::total_cmp`]
    ///
    /// Ascending order puts NaN after `+inf`. Sorting a view reorders the
    /// positions it addresses and leaves the rest of the buffer alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let mut v = Vector::from_slice(&[3.0, f64::NAN, -1.0, 2.0]);
    /// v.sort_values(true);
    /// assert_eq!(&v.to_vec()[..3], &[-1.0, 2.0, 3.0]);
    /// assert!(v.get(3).is_nan());
    /// ```
    pub fn sort_values(&mut self, ascending: bool) -> &mut Self {
        let order = |a: &f64, b: &f64| {
            if ascending {
                a.total_cmp(b)
            } else {
                b.total_cmp(a)
            }
        };
        if let Some(run) = self.layout.dense_run() {
            self.storage.write()[run.range()].sort_by(order);
            return self;
        }
        dispatch::trace_generic("sort_values", self.len());
        let mut values = self.to_vec();
        values.sort_by(order);
        self.store(&values);
        self
    }

    /// Sorted dense copy; `self` is unchanged
    pub fn sort_values_new(&self, ascending: bool) -> Vector {
        let mut sorted = self.copy();
        sorted.sort_values(ascending);
        sorted
    }

    /// Solid copy into a fresh dense buffer
    pub fn copy(&self) -> Vector {
        Vector::from_parts(
            Storage::from_vec(self.to_vec()),
            VectorLayout::Dense {
                offset: 0,
                size: self.len(),
            },
            self.backend,
        )
    }

    /// Dense copy truncated or zero-padded to `len` elements
    pub fn dense_copy(&self, len: usize) -> Vector {
        let mut values = self.to_vec();
        values.resize(len, 0.0);
        let mut copy = Vector::from_vec(values);
        copy.backend = self.backend;
        copy
    }

    /// Elements in logical order
    pub fn to_vec(&self) -> Vec<f64> {
        let buf = self.storage.read();
        match self.layout.dense_run() {
            Some(run) => buf[run.range()].to_vec(),
            None => self.layout.positions().map(|p| buf[p]).collect(),
        }
    }

    /// Copy as an `n × 1` column matrix
    pub fn as_matrix(&self) -> Matrix {
        Matrix::from_parts_dense(self.len(), 1, self.to_vec(), self.backend)
    }

    fn kernel(&self) -> Kernel {
        Kernel::for_backend(self.backend)
    }

    fn conform(&self, context: &'static str, other: usize) -> Result<()> {
        if self.len() != other {
            return Err(LinalgError::mismatch(context, self.len(), other));
        }
        Ok(())
    }

    /// Fold every element in logical order under one read lock
    fn fold<B>(&self, init: B, mut f: impl FnMut(B, f64) -> B) -> B {
        let buf = self.storage.read();
        match self.layout.dense_run() {
            Some(run) => buf[run.range()].iter().fold(init, |acc, &x| f(acc, x)),
            None => self.layout.positions().fold(init, |acc, p| f(acc, buf[p])),
        }
    }

    /// Rewrite every element as `f(i, x)`, in logical order
    ///
    /// `f` runs with no lock held, so it may read any view of this buffer. It
    /// sees the values from before the call.
    fn update_indexed(&mut self, mut f: impl FnMut(usize, f64) -> f64) {
        let values: Vec<f64> = self
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, x)| f(i, x))
            .collect();
        self.store(&values);
    }

    /// Overwrite the elements in logical order with `values` under one write lock
    fn store(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.len());
        let mut buf = self.storage.write();
        match self.layout.dense_run() {
            Some(run) => buf[run.range()].copy_from_slice(values),
            None => {
                for (p, &x) in self.layout.positions().zip(values) {
                    buf[p] = x;
                }
            }
        }
    }

    /// Run `lanes` on the contiguous run, or `scalar` per element otherwise
    fn update_with(
        &mut self,
        name: &'static str,
        lanes: impl FnOnce(Kernel, &mut [f64]),
        scalar: impl Fn(f64) -> f64,
    ) {
        let kernel = self.kernel();
        let mut buf = self.storage.write();
        match dispatch::select_unary(&self.layout) {
            Path::Fast(run, _) => lanes(kernel, &mut buf[run.range()]),
            Path::Generic => {
                dispatch::trace_generic(name, self.layout.len());
                for p in self.layout.positions() {
                    buf[p] = scalar(buf[p]);
                }
            }
        }
    }

    /// Combine `other` into `self` element by element
    ///
    /// Sizes are checked before any write. When both share a buffer the
    /// operand is materialized first, so overlapping views read the values
    /// they had before the call.
    fn zip_assign(&mut self, other: &Vector, zip: Zip) -> Result<()> {
        self.conform(zip.name(), other.len())?;
        let kernel = self.kernel();
        if self.storage.same_buffer(&other.storage) {
            let snapshot = other.to_vec();
            let operand = VectorLayout::Dense {
                offset: 0,
                size: snapshot.len(),
            };
            let mut buf = self.storage.write();
            zip_into(kernel, zip, &mut buf, &self.layout, &snapshot, &operand);
        } else {
            Storage::with_write_read(&self.storage, &other.storage, |dest, src| {
                zip_into(kernel, zip, dest, &self.layout, src, &other.layout)
            });
        }
        Ok(())
    }

    /// Overwrite every element with the matching element of `src`
    pub(crate) fn copy_from(&mut self, src: &Vector) -> Result<()> {
        self.zip_assign(src, Zip::Assign)
    }

    /// `self = self op other`, or a plain copy when `op` is `None`
    pub(crate) fn combine(&mut self, other: &Vector, op: Option<BinaryOp>) -> Result<()> {
        match op {
            Some(op) => self.zip_assign(other, Zip::Binary(op)),
            None => self.zip_assign(other, Zip::Assign),
        }
    }

    /// Write `self` into `to`, then combine `other` into `to`
    fn zip_to(&self, other: &Vector, to: &mut Vector, zip: Zip) -> Result<()> {
        self.conform(zip.name(), other.len())?;
        self.conform(zip.name(), to.len())?;
        let snapshot;
        let operand = if to.shares_storage(other) {
            snapshot = other.copy();
            &snapshot
        } else {
            other
        };
        to.copy_from(self)?;
        to.zip_assign(operand, zip)
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("backend", &self.backend)
            .field("layout", &self.layout)
            .field("values", &self.to_vec())
            .finish()
    }
}

/// Element combination run by [`Vector::zip_assign`]
#[derive(Debug, Clone, Copy)]
enum Zip {
    Assign,
    Binary(BinaryOp),
    Axpy(f64),
}

impl Zip {
    fn name(self) -> &'static str {
        match self {
            Zip::Assign => "copy",
            Zip::Binary(op) => op.name(),
            Zip::Axpy(_) => "fma",
        }
    }

    fn lanes(self, kernel: Kernel, acc: &mut [f64], src: &[f64]) {
        match self {
            Zip::Assign => acc.copy_from_slice(src),
            Zip::Binary(op) => kernel.binary_assign(op, acc, src),
            Zip::Axpy(alpha) => kernel.axpy(alpha, src, acc),
        }
    }

    fn scalar(self, acc: f64, src: f64) -> f64 {
        match self {
            Zip::Assign => src,
            Zip::Binary(op) => op.apply(acc, src),
            Zip::Axpy(alpha) => acc + alpha * src,
        }
    }
}

fn zip_into(
    kernel: Kernel,
    zip: Zip,
    dest: &mut [f64],
    dest_layout: &VectorLayout,
    src: &[f64],
    src_layout: &VectorLayout,
) {
    match dispatch::select_binary(dest_layout, src_layout) {
        Path::Fast(d, Some(s)) => zip.lanes(kernel, &mut dest[d.range()], &src[s.range()]),
        _ => {
            dispatch::trace_generic(zip.name(), dest_layout.len());
            for i in 0..dest_layout.len() {
                let p = dest_layout.position(i);
                dest[p] = zip.scalar(dest[p], src[src_layout.position(i)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Columns(Vec<Vec<f64>>);

    impl TabularSource for Columns {
        fn row_count(&self) -> usize {
            self.0.first().map_or(0, Vec::len)
        }
        fn col_count(&self) -> usize {
            self.0.len()
        }
        fn get_double(&self, row: usize, col: usize) -> f64 {
            self.0[col][row]
        }
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Vector::zeros(3).to_vec(), vec![0.0; 3]);
        assert_eq!(Vector::fill(2, 7.0).to_vec(), vec![7.0, 7.0]);
        assert_eq!(
            Vector::from_fn(4, |i| i as f64 * 2.0).to_vec(),
            vec![0.0, 2.0, 4.0, 6.0]
        );
        assert!(Vector::from_vec(Vec::new()).is_empty());
    }

    #[test]
    fn test_random_seeded_reproducible() {
        let a = Vector::random_seeded(20, 3);
        let b = Vector::random_seeded(20, 3);
        assert_eq!(a.to_vec(), b.to_vec());
        assert_eq!(Vector::random(5).len(), 5);
    }

    #[test]
    fn test_random_with_closure() {
        let mut k = 0.0;
        let v = Vector::random_with(3, &mut || {
            k += 0.5;
            k
        });
        assert_eq!(v.to_vec(), vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_from_column() {
        let table = Columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(Vector::from_column(&table, 1).unwrap().to_vec(), vec![3.0, 4.0]);
        assert!(matches!(
            Vector::from_column(&table, 2),
            Err(LinalgError::OutOfRangeConstruction(_))
        ));
    }

    #[test]
    fn test_wrap_shares_and_validates() {
        let storage = Storage::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let v = Vector::wrap(storage.clone(), 1, 3).unwrap();
        assert_eq!(v.to_vec(), vec![1.0, 2.0, 3.0]);
        assert!(Vector::wrap(storage.clone(), 4, 3).is_err());

        let s = Vector::wrap_strided(storage.clone(), 0, 2, 3).unwrap();
        assert_eq!(s.to_vec(), vec![0.0, 2.0, 4.0]);
        assert!(Vector::wrap_strided(storage.clone(), 1, 2, 3).is_err());

        let m = Vector::wrap_mapped(storage.clone(), &[5, 0]).unwrap();
        assert_eq!(m.to_vec(), vec![5.0, 0.0]);
        assert!(Vector::wrap_mapped(storage, &[6]).is_err());
    }

    #[test]
    fn test_set_visible_through_views() {
        let v = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let mut tail = v.range(2, 4).unwrap();
        tail.set(0, 30.0);
        tail.inc(1, 1.0);
        assert_eq!(v.to_vec(), vec![1.0, 2.0, 30.0, 5.0]);
        assert!(tail.shares_storage(&v));

        let mut copy = v.copy();
        copy.set(0, -1.0);
        assert_eq!(v.get(0), 1.0);
        assert!(!copy.shares_storage(&v));
    }

    #[test]
    fn test_map_of_range_composes() {
        let v = Vector::from_fn(10, |i| i as f64);
        let r = v.range(2, 8).unwrap();
        let m = r.map(&[5, 1, 3]).unwrap();
        assert_eq!(m.to_vec(), vec![7.0, 3.0, 5.0]);
        assert_eq!(v.map_copy(&[9, 0]).unwrap().to_vec(), vec![9.0, 0.0]);
        assert!(v.map(&[]).is_err());
    }

    #[test]
    fn test_map_to() {
        let v = Vector::from_slice(&[10.0, 20.0, 30.0, 40.0]);
        let mut to = Vector::zeros(2);
        v.map_to(&[3, 1], &mut to).unwrap();
        assert_eq!(to.to_vec(), vec![40.0, 20.0]);

        let mut short = Vector::fill(1, -1.0);
        assert!(matches!(
            v.map_to(&[0, 1], &mut short),
            Err(LinalgError::DimensionMismatch { .. })
        ));
        assert!(v.map_to(&[4, 0], &mut to).is_err());
        assert_eq!(short.to_vec(), vec![-1.0]);
        assert_eq!(to.to_vec(), vec![40.0, 20.0]);
    }

    #[test]
    fn test_sort_values_dense_and_views() {
        let mut v = Vector::from_slice(&[3.0, -1.0, 2.0, 0.5]);
        v.sort_values(false);
        assert_eq!(v.to_vec(), vec![3.0, 2.0, 0.5, -1.0]);

        // Strided view sorts only the addressed positions
        let storage = Storage::from_vec(vec![5.0, 0.0, 1.0, 0.0, 3.0]);
        let mut s = Vector::wrap_strided(storage.clone(), 0, 2, 3).unwrap();
        s.sort_values(true);
        assert_eq!(storage.to_vec(), vec![1.0, 0.0, 3.0, 0.0, 5.0]);

        let m = v.map(&[3, 0]).unwrap();
        let sorted = m.sort_values_new(true);
        assert_eq!(sorted.to_vec(), vec![-1.0, 3.0]);
        assert!(!sorted.shares_storage(&v));
        assert_eq!(v.to_vec(), vec![3.0, 2.0, 0.5, -1.0]);
    }

    #[test]
    fn test_dense_copy_pads_and_truncates() {
        let v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(v.dense_copy(5).to_vec(), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
        assert_eq!(v.dense_copy(2).to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_as_matrix() {
        let m = Vector::from_slice(&[1.0, 2.0]).as_matrix();
        assert_eq!((m.rows(), m.cols()), (2, 1));
        assert_eq!(m.get(1, 0), 2.0);
    }

    #[test]
    fn test_with_backend() {
        let v = Vector::zeros(2).with_backend(Backend::Scalar).unwrap();
        assert_eq!(v.backend(), Backend::Scalar);
        let auto = Vector::zeros(2).with_backend(Backend::Auto).unwrap();
        assert_ne!(auto.backend(), Backend::Auto);
    }

    #[test]
    fn test_copy_from_overlapping_views() {
        let v = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut dest = v.range(1, 5).unwrap();
        let src = v.range(0, 4).unwrap();
        dest.copy_from(&src).unwrap();
        assert_eq!(v.to_vec(), vec![1.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
