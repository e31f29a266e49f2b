//! Matrix views over shared storage
//!
//! A [`Matrix`] is a [`Storage`] handle, a [`MatrixLayout`] and a [`Backend`].
//! Dense matrices are row-major or column-major over one buffer; mapped
//! matrices select arbitrary rows and columns of another matrix without
//! copying.
//!
//! # Example
//!
//! ```
//! use dlinalg::Matrix;
//!
//! let m = Matrix::wrap(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let t = m.t();
//!
//! assert_eq!((t.rows(), t.cols()), (3, 2));
//! assert_eq!(t.get(2, 1), 6.0);
//! assert!(t.shares_storage(&m));
//! ```
//!
//! Submodules:
//!
//! - `axis`: row/column broadcasting and per-axis statistics
//! - `construct`: factories and imports from flat, nested, vector and tabular data
//! - `multiply`: block-parallel matrix×vector and matrix×matrix

mod axis;
mod construct;
mod multiply;

pub use axis::Axis;
pub use construct::CopyRange;

use std::fmt;

use crate::dispatch::{self, Kernel};
use crate::error::{LinalgError, Result};
use crate::layout::{MatrixLayout, VectorLayout};
use crate::ops::{BinaryOp, UnaryOp};
use crate::storage::Storage;
use crate::vector::Vector;
use crate::Backend;

/// Matrix view over a shared `f64` buffer
///
/// # Storage Layout
///
/// For a 2x3 row-major matrix:
/// ```text
/// [[a, b, c],
///  [d, e, f]]
/// ```
/// Data is stored as: [a, b, c, d, e, f]. Its transpose reads the same buffer
/// as a 3x2 column-major matrix.
pub struct Matrix {
    storage: Storage,
    layout: MatrixLayout,
    backend: Backend,
}

impl Matrix {
    pub(crate) fn from_parts(storage: Storage, layout: MatrixLayout, backend: Backend) -> Self {
        Matrix {
            storage,
            layout,
            backend,
        }
    }

    /// Row-major matrix over `values`; `values.len()` must be `rows * cols`
    pub(crate) fn from_parts_dense(rows: usize, cols: usize, values: Vec<f64>, backend: Backend) -> Self {
        debug_assert_eq!(values.len(), rows * cols);
        Matrix::from_parts(
            Storage::from_vec(values),
            MatrixLayout::row_major(0, rows, cols, cols),
            backend,
        )
    }

    pub(crate) fn with_backend_unchecked(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Run this matrix's kernels on `backend`
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

    /// Backend running this matrix's kernels
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Addressing of this view
    pub fn layout(&self) -> &MatrixLayout {
        &self.layout
    }

    /// Backing buffer handle
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.layout.rows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// True when both matrices address the same backing buffer
    pub fn shares_storage(&self, other: &Matrix) -> bool {
        self.storage.same_buffer(&other.storage)
    }

    /// Element `(row, col)`
    ///
    /// # Panics
    ///
    /// When the indices are outside the view.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.storage.read()[self.layout.position(row, col)]
    }

    /// Overwrite element `(row, col)`; visible through every view of it
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let pos = self.layout.position(row, col);
        self.storage.write()[pos] = value;
    }

    /// Add `delta` to element `(row, col)`
    pub fn inc(&mut self, row: usize, col: usize, delta: f64) {
        let pos = self.layout.position(row, col);
        self.storage.write()[pos] += delta;
    }

    /// Second handle over the same elements
    pub fn view(&self) -> Matrix {
        Matrix::from_parts(self.storage.clone(), self.layout.clone(), self.backend)
    }

    /// Transpose over the same buffer; O(1), no copy
    pub fn t(&self) -> Matrix {
        Matrix::from_parts(self.storage.clone(), self.layout.transpose(), self.backend)
    }

    /// Row `row` as a vector view (dense for row-major storage)
    pub fn map_row(&self, row: usize) -> Result<Vector> {
        check_index("row", row, self.rows())?;
        Ok(self.line_view(self.layout.row(row)))
    }

    /// Column `col` as a vector view (strided for row-major storage)
    pub fn map_col(&self, col: usize) -> Result<Vector> {
        check_index("column", col, self.cols())?;
        Ok(self.line_view(self.layout.col(col)))
    }

    /// Dense copy of row `row`
    pub fn map_row_copy(&self, row: usize) -> Result<Vector> {
        Ok(self.map_row(row)?.copy())
    }

    /// Dense copy of column `col`
    pub fn map_col_copy(&self, col: usize) -> Result<Vector> {
        Ok(self.map_col(col)?.copy())
    }

    /// Copy row `row` into `to`
    ///
    /// # Errors
    ///
    /// [`LinalgError::OutOfRangeConstruction`] for a bad row,
    /// [`LinalgError::DimensionMismatch`] unless `to.len() == cols`.
    pub fn map_row_to(&self, row: usize, to: &mut Vector) -> Result<()> {
        let line = self.map_row(row)?;
        to.copy_from(&line)
    }

    /// Copy column `col` into `to`
    pub fn map_col_to(&self, col: usize, to: &mut Vector) -> Result<()> {
        let line = self.map_col(col)?;
        to.copy_from(&line)
    }

    fn line_view(&self, layout: VectorLayout) -> Vector {
        Vector::from_parts(self.storage.clone(), layout, self.backend)
    }

    /// View of the rows at `indices`, in that order
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Matrix;
    ///
    /// let m = Matrix::from_fn(3, 2, |r, c| (r * 10 + c) as f64);
    /// let mut picked = m.map_rows(&[2]).unwrap();
    /// picked.set(0, 1, -1.0);
    ///
    /// assert_eq!(m.get(2, 1), -1.0);
    /// ```
    pub fn map_rows(&self, indices: &[usize]) -> Result<Matrix> {
        let layout = self.layout.map_rows(indices)?;
        Ok(Matrix::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// View of the columns at `indices`, in that order
    pub fn map_cols(&self, indices: &[usize]) -> Result<Matrix> {
        let layout = self.layout.map_cols(indices)?;
        Ok(Matrix::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// View of the rows in `[start, end)`; dense when the source is dense
    pub fn range_rows(&self, start: usize, end: usize) -> Result<Matrix> {
        let layout = self.layout.range_rows(start, end)?;
        Ok(Matrix::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// View of the columns in `[start, end)`; dense when the source is dense
    pub fn range_cols(&self, start: usize, end: usize) -> Result<Matrix> {
        let layout = self.layout.range_cols(start, end)?;
        Ok(Matrix::from_parts(self.storage.clone(), layout, self.backend))
    }

    /// View of every row not listed in `indices`
    pub fn remove_rows(&self, indices: &[usize]) -> Result<Matrix> {
        let keep = complement("row", indices, self.rows())?;
        self.map_rows(&keep)
    }

    /// View of every column not listed in `indices`
    pub fn remove_cols(&self, indices: &[usize]) -> Result<Matrix> {
        let keep = complement("column", indices, self.cols())?;
        self.map_cols(&keep)
    }

    /// Copy the rows at `indices` into `to`
    ///
    /// # Errors
    ///
    /// [`LinalgError::DimensionMismatch`] unless `to` is `indices.len() × cols`.
    pub fn map_rows_to(&self, indices: &[usize], to: &mut Matrix) -> Result<()> {
        let selected = self.map_rows(indices)?;
        to.zip_assign(&selected, "map_rows_to", None)
    }

    /// Copy the columns at `indices` into `to`
    pub fn map_cols_to(&self, indices: &[usize], to: &mut Matrix) -> Result<()> {
        let selected = self.map_cols(indices)?;
        to.zip_assign(&selected, "map_cols_to", None)
    }

    /// Copy the rows in `[start, end)` into `to`
    pub fn range_rows_to(&self, start: usize, end: usize, to: &mut Matrix) -> Result<()> {
        let selected = self.range_rows(start, end)?;
        to.zip_assign(&selected, "range_rows_to", None)
    }

    /// Copy the columns in `[start, end)` into `to`
    pub fn range_cols_to(&self, start: usize, end: usize, to: &mut Matrix) -> Result<()> {
        let selected = self.range_cols(start, end)?;
        to.zip_assign(&selected, "range_cols_to", None)
    }

    /// Solid row-major copy into a fresh buffer
    pub fn copy(&self) -> Matrix {
        Matrix::from_parts_dense(self.rows(), self.cols(), self.to_row_major_vec(), self.backend)
    }

    /// Elements in row-major order
    pub fn to_row_major_vec(&self) -> Vec<f64> {
        let buf = self.storage.read();
        if let Some(run) = self.layout.row_major_run() {
            return buf[run.range()].to_vec();
        }
        let mut out = Vec::with_capacity(self.rows() * self.cols());
        for r in 0..self.rows() {
            out.extend((0..self.cols()).map(|c| buf[self.layout.position(r, c)]));
        }
        out
    }

    /// Fold every element in row-major order as `f(acc, row, col, value)`
    pub(crate) fn fold_elements<B>(&self, init: B, mut f: impl FnMut(B, usize, usize, f64) -> B) -> B {
        let buf = self.storage.read();
        let mut acc = init;
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                acc = f(acc, r, c, buf[self.layout.position(r, c)]);
            }
        }
        acc
    }

    /// Rewrite every element, vectorized when storage is one contiguous run
    fn update_with(
        &mut self,
        name: &'static str,
        lanes: impl FnOnce(Kernel, &mut [f64]),
        scalar: impl Fn(f64) -> f64,
    ) {
        let kernel = Kernel::for_backend(self.backend);
        let mut buf = self.storage.write();
        match self.layout.contiguous_run() {
            Some(run) => lanes(kernel, &mut buf[run.range()]),
            None => {
                dispatch::trace_generic(name, self.rows() * self.cols());
                for r in 0..self.layout.rows() {
                    for c in 0..self.layout.cols() {
                        let p = self.layout.position(r, c);
                        buf[p] = scalar(buf[p]);
                    }
                }
            }
        }
    }

    /// Replace every element `x` with `f(x)`
    ///
    /// `f` runs with no lock held and sees the values from before the call,
    /// so it may read other views of this buffer.
    pub fn apply(&mut self, f: impl Fn(f64) -> f64) -> &mut Self {
        self.update_indexed(|_, _, x| f(x));
        self
    }

    /// Apply `op` to every element
    pub fn apply_op(&mut self, op: UnaryOp) -> &mut Self {
        self.update_with(op.name(), |k, run| k.unary_assign(op, run), op.scalar());
        self
    }

    /// Set every element to `value`
    pub fn fill_value(&mut self, value: f64) -> &mut Self {
        self.update_with("fill", |_, run| run.fill(value), |_| value);
        self
    }

    fn binary_scalar(&mut self, op: BinaryOp, x: f64) -> &mut Self {
        self.update_with(
            op.name(),
            |k, run| k.binary_scalar_assign(op, run, x),
            |v| op.apply(v, x),
        );
        self
    }

    fn conform(&self, context: &'static str, other: &Matrix) -> Result<()> {
        if self.rows() != other.rows() {
            return Err(LinalgError::mismatch(context, self.rows(), other.rows()));
        }
        if self.cols() != other.cols() {
            return Err(LinalgError::mismatch(context, self.cols(), other.cols()));
        }
        Ok(())
    }

    /// Combine `other` into `self` through the vector kernels
    ///
    /// One pass when both are contiguous row-major, otherwise row by row. An
    /// operand sharing this buffer is copied first.
    fn zip_assign(&mut self, other: &Matrix, context: &'static str, op: Option<BinaryOp>) -> Result<()> {
        self.conform(context, other)?;
        let snapshot;
        let other = if self.shares_storage(other) {
            snapshot = other.copy();
            &snapshot
        } else {
            other
        };

        if let (Some(d), Some(s)) = (self.layout.row_major_run(), other.layout.row_major_run()) {
            let mut dest = self.line_view(VectorLayout::Dense {
                offset: d.offset,
                size: d.len,
            });
            let src = other.line_view(VectorLayout::Dense {
                offset: s.offset,
                size: s.len,
            });
            return dest.combine(&src, op);
        }
        for r in 0..self.rows() {
            let mut dest = self.line_view(self.layout.row(r));
            let src = other.line_view(other.layout.row(r));
            dest.combine(&src, op)?;
        }
        Ok(())
    }

    /// Sum of all elements
    pub fn sum(&self) -> f64 {
        self.fold_elements(0.0, |acc, _, _, x| acc + x)
    }

    /// Mean of all elements; NaN for an empty matrix
    pub fn mean(&self) -> f64 {
        self.sum() / (self.rows() * self.cols()) as f64
    }

    /// Sum of the main diagonal of a square matrix
    pub fn trace(&self) -> Result<f64> {
        if self.rows() != self.cols() {
            return Err(LinalgError::mismatch("trace", self.rows(), self.cols()));
        }
        Ok(self.diag().sum())
    }

    /// Copy of the main diagonal
    pub fn diag(&self) -> Vector {
        let n = self.rows().min(self.cols());
        let buf = self.storage.read();
        let values = (0..n).map(|i| buf[self.layout.position(i, i)]).collect();
        drop(buf);
        Vector::from_parts(
            Storage::from_vec(values),
            VectorLayout::Dense { offset: 0, size: n },
            self.backend,
        )
    }

    /// `self · diag(v)`: copy with column `j` scaled by `v_j`
    pub fn dot_diag(&self, v: &Vector) -> Result<Matrix> {
        if v.len() != self.cols() {
            return Err(LinalgError::mismatch("dot_diag", self.cols(), v.len()));
        }
        let scale = v.to_vec();
        let mut out = self.copy();
        out.update_indexed(|_, c, x| x * scale[c]);
        Ok(out)
    }

    /// `diag(v) · self`: copy with row `i` scaled by `v_i`
    pub fn dot_diag_t(&self, v: &Vector) -> Result<Matrix> {
        if v.len() != self.rows() {
            return Err(LinalgError::mismatch("dot_diag_t", self.rows(), v.len()));
        }
        let scale = v.to_vec();
        let mut out = self.copy();
        out.update_indexed(|r, _, x| x * scale[r]);
        Ok(out)
    }

    /// Rewrite every element as `f(row, col, x)` from a row-major snapshot
    fn update_indexed(&mut self, f: impl Fn(usize, usize, f64) -> f64) {
        let cols = self.cols();
        let values: Vec<f64> = self
            .to_row_major_vec()
            .into_iter()
            .enumerate()
            .map(|(i, x)| f(i / cols, i % cols, x))
            .collect();
        self.store_row_major(&values);
    }

    /// Overwrite every element from `values` in row-major order under one write lock
    fn store_row_major(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.rows() * self.cols());
        let mut buf = self.storage.write();
        if let Some(run) = self.layout.row_major_run() {
            buf[run.range()].copy_from_slice(values);
            return;
        }
        for (i, &x) in values.iter().enumerate() {
            let (r, c) = (i / self.cols(), i % self.cols());
            buf[self.layout.position(r, c)] = x;
        }
    }

    /// Same shape and every pair of elements within `eps`
    ///
    /// NaNs at the same position compare equal.
    pub fn deep_equals(&self, other: &Matrix, eps: f64) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        self.to_row_major_vec()
            .iter()
            .zip(other.to_row_major_vec())
            .all(|(&a, b)| (a.is_nan() && b.is_nan()) || (a - b).abs() <= eps)
    }
}

/// Elementwise and scalar arithmetic for each binary operator
macro_rules! elementwise_methods {
    ($($name:ident, $scalar:ident => $op:ident;)*) => {
        impl Matrix {
            $(
                #[doc = concat!("Elementwise `", stringify!($name), "` of a same-shape matrix, in place")]
                pub fn $name(&mut self, other: &Matrix) -> Result<&mut Self> {
                    self.zip_assign(other, BinaryOp::$op.name(), Some(BinaryOp::$op))?;
                    Ok(self)
                }

                #[doc = concat!("`", stringify!($name), "` a scalar to every element, in place")]
                pub fn $scalar(&mut self, x: f64) -> &mut Self {
                    self.binary_scalar(BinaryOp::$op, x)
                }
            )*
        }
    };
}

elementwise_methods! {
    add, add_scalar => Add;
    sub, sub_scalar => Sub;
    mul, mul_scalar => Mul;
    div, div_scalar => Div;
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows())
            .field("cols", &self.cols())
            .field("backend", &self.backend)
            .field("values", &self.to_row_major_vec())
            .finish()
    }
}

fn check_index(what: &str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(LinalgError::OutOfRangeConstruction(format!(
            "{what} {index} out of range for {len} {what}s"
        )));
    }
    Ok(())
}

fn complement(what: &str, removed: &[usize], len: usize) -> Result<Vec<usize>> {
    if let Some(&bad) = removed.iter().find(|&&i| i >= len) {
        return Err(LinalgError::OutOfRangeConstruction(format!(
            "{what} {bad} out of range for {len} {what}s"
        )));
    }
    Ok((0..len).filter(|i| !removed.contains(i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        // [[0, 1, 2], [10, 11, 12], [20, 21, 22]]
        Matrix::from_fn(3, 3, |r, c| (r * 10 + c) as f64)
    }

    #[test]
    fn test_transpose_shares_storage() {
        let mut m = sample();
        let mut t = m.t();
        assert_eq!(t.get(0, 2), 20.0);

        m.set(1, 2, -5.0);
        assert_eq!(t.get(2, 1), -5.0);
        t.set(0, 1, 99.0);
        assert_eq!(m.get(1, 0), 99.0);

        assert!(m.t().t().deep_equals(&m, 0.0));
    }

    #[test]
    fn test_row_and_col_views() {
        let m = sample();
        assert_eq!(m.map_row(1).unwrap().to_vec(), vec![10.0, 11.0, 12.0]);
        assert_eq!(m.map_col(2).unwrap().to_vec(), vec![2.0, 12.0, 22.0]);

        let mut col = m.map_col(0).unwrap();
        col.set(2, -1.0);
        assert_eq!(m.get(2, 0), -1.0);

        let mut copy = m.map_row_copy(0).unwrap();
        copy.set(0, 123.0);
        assert_eq!(m.get(0, 0), 0.0);

        assert!(m.map_row(3).is_err());
        assert!(m.map_col_copy(5).is_err());
    }

    #[test]
    fn test_map_rows_view_aliases_source() {
        let m = sample();
        let mut row = m.map_rows(&[2]).unwrap();
        row.set(0, 0, 7.0);
        assert_eq!(m.get(2, 0), 7.0);

        let picked = m.map_cols(&[2, 0]).unwrap();
        assert_eq!(picked.to_row_major_vec(), vec![2.0, 0.0, 12.0, 10.0, 22.0, 7.0]);
    }

    #[test]
    fn test_range_and_remove() {
        let m = sample();
        let block = m.range_rows(1, 3).unwrap().range_cols(0, 2).unwrap();
        assert_eq!(block.to_row_major_vec(), vec![10.0, 11.0, 20.0, 21.0]);

        let rest = m.remove_rows(&[1]).unwrap();
        assert_eq!(rest.map_col(0).unwrap().to_vec(), vec![0.0, 20.0]);
        let rest = m.remove_cols(&[0, 2]).unwrap();
        assert_eq!(rest.shape(), (3, 1));
        assert!(m.remove_rows(&[0, 1, 2]).is_err());
        assert!(m.remove_cols(&[3]).is_err());
    }

    #[test]
    fn test_map_rows_to() {
        let m = sample();
        let mut to = Matrix::zeros(2, 3);
        m.map_rows_to(&[2, 0], &mut to).unwrap();
        assert_eq!(to.to_row_major_vec(), vec![20.0, 21.0, 22.0, 0.0, 1.0, 2.0]);

        let mut cols = Matrix::zeros(3, 1);
        m.map_cols_to(&[1], &mut cols).unwrap();
        assert_eq!(cols.to_row_major_vec(), vec![1.0, 11.0, 21.0]);

        assert!(m.map_rows_to(&[0], &mut Matrix::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_line_and_range_copies_to_destination() {
        let m = sample();
        let mut row = Vector::zeros(3);
        m.map_row_to(2, &mut row).unwrap();
        assert_eq!(row.to_vec(), vec![20.0, 21.0, 22.0]);

        // Strided destination
        let wide = Matrix::zeros(3, 2);
        let mut col = wide.map_col(1).unwrap();
        m.map_col_to(1, &mut col).unwrap();
        assert_eq!(wide.to_row_major_vec(), vec![0.0, 1.0, 0.0, 11.0, 0.0, 21.0]);

        assert!(m.map_row_to(3, &mut row).is_err());
        assert!(m.map_col_to(0, &mut Vector::zeros(2)).is_err());

        let mut rows = Matrix::zeros(2, 3);
        m.range_rows_to(1, 3, &mut rows).unwrap();
        assert_eq!(rows.to_row_major_vec(), vec![10.0, 11.0, 12.0, 20.0, 21.0, 22.0]);

        let mut cols = Matrix::zeros(2, 3).t();
        m.range_cols_to(0, 2, &mut cols).unwrap();
        assert_eq!(cols.to_row_major_vec(), vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]);

        assert!(m.range_rows_to(0, 1, &mut rows).is_err());
        assert!(m.range_cols_to(2, 1, &mut cols).is_err());
    }

    #[test]
    fn test_copy_is_independent_row_major() {
        let m = sample();
        let c = m.t().copy();
        assert_eq!(&c.to_row_major_vec()[..3], &[0.0, 10.0, 20.0]);
        assert!(!c.shares_storage(&m));
        assert!(c.layout().row_major_run().is_some());
    }

    #[test]
    fn test_apply_contiguous_and_strided() {
        let mut m = sample();
        m.apply(|x| x + 1.0);
        assert_eq!(m.get(2, 2), 23.0);

        // Sub-block rows are not contiguous
        let mut block = m.range_cols(1, 3).unwrap();
        block.apply_op(UnaryOp::Neg);
        assert_eq!(&m.to_row_major_vec()[..3], &[1.0, -2.0, -3.0]);

        block.fill_value(0.5);
        assert_eq!(m.get(1, 0), 11.0);
        assert_eq!(m.get(1, 1), 0.5);
    }

    #[test]
    fn test_apply_reads_aliased_views() {
        let mut m = sample();
        let t = m.t();
        let corner = m.map_row(2).unwrap();
        m.apply(|x| x + t.get(0, 0) + corner.get(2));
        assert_eq!(m.get(0, 0), 22.0);
        assert_eq!(m.get(2, 2), 44.0);

        // Non-contiguous view reading through its own transpose
        let mut block = m.range_cols(1, 3).unwrap();
        let bt = block.t();
        block.apply(|x| x - bt.get(1, 0));
        assert_eq!(&m.to_row_major_vec()[..3], &[22.0, -1.0, 0.0]);
        assert_eq!(m.get(1, 0), 32.0);
        assert_eq!(m.get(1, 1), 9.0);
    }

    #[test]
    fn test_elementwise_arithmetic() {
        let mut a = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Matrix::wrap(2, 2, vec![4.0, 3.0, 2.0, 1.0]).unwrap();
        a.add(&b).unwrap().mul_scalar(2.0);
        assert_eq!(a.to_row_major_vec(), vec![10.0; 4]);

        a.sub(&b.t()).unwrap();
        assert_eq!(a.to_row_major_vec(), vec![6.0, 8.0, 7.0, 9.0]);

        assert!(a.div(&Matrix::zeros(2, 3)).is_err());
        assert_eq!(a.get(0, 0), 6.0);
    }

    #[test]
    fn test_elementwise_with_own_transpose() {
        let mut a = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let t = a.t();
        a.add(&t).unwrap();
        assert_eq!(a.to_row_major_vec(), vec![2.0, 5.0, 5.0, 8.0]);
    }

    #[test]
    fn test_summaries() {
        let m = sample();
        assert_eq!(m.sum(), 99.0);
        assert_eq!(m.mean(), 11.0);
        assert_eq!(m.trace().unwrap(), 33.0);
        assert_eq!(m.diag().to_vec(), vec![0.0, 11.0, 22.0]);
        assert!(Matrix::zeros(2, 3).trace().is_err());
    }

    #[test]
    fn test_dot_diag() {
        let m = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let v = Vector::from_slice(&[10.0, 100.0]);
        assert_eq!(
            m.dot_diag(&v).unwrap().to_row_major_vec(),
            vec![10.0, 200.0, 30.0, 400.0]
        );
        assert_eq!(
            m.dot_diag_t(&v).unwrap().to_row_major_vec(),
            vec![10.0, 20.0, 300.0, 400.0]
        );
        assert!(m.dot_diag(&Vector::zeros(3)).is_err());
    }

    #[test]
    fn test_deep_equals() {
        let a = sample();
        let mut b = a.copy();
        assert!(a.deep_equals(&b, 0.0));
        b.inc(0, 0, 1e-3);
        assert!(!a.deep_equals(&b, 1e-6));
        assert!(a.deep_equals(&b, 1e-2));
        assert!(!a.deep_equals(&Matrix::zeros(3, 2), 1.0));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_transpose_involution(
            rows in 1usize..8,
            cols in 1usize..8,
            seed in any::<u64>()
        ) {
            let m = Matrix::random_seeded(rows, cols, seed);
            let tt = m.t().t();
            prop_assert!(tt.deep_equals(&m, 0.0));
            prop_assert!(tt.shares_storage(&m));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_col_view_matches_get(
            rows in 1usize..8,
            cols in 1usize..8,
            seed in any::<u64>()
        ) {
            let m = Matrix::random_seeded(rows, cols, seed);
            for c in 0..cols {
                let col = m.map_col(c).unwrap().to_vec();
                for (r, v) in col.iter().enumerate() {
                    prop_assert_eq!(*v, m.get(r, c));
                }
            }
        }
    }
}
