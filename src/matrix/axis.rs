//! Row and column broadcasting, per-axis statistics
//!
//! [`Axis::Rows`] runs down the rows and pairs with one value per column.
//! [`Axis::Cols`] runs across the columns and pairs with one value per row.
//! Every line is read through a vector view, so row-major rows take the
//! vectorized kernels and columns take the strided path.

use super::Matrix;
use crate::error::{LinalgError, Result};
use crate::layout::VectorLayout;
use crate::ops::BinaryOp;
use crate::storage::Storage;
use crate::vector::Vector;

/// Direction of an axis-wise operation
///
/// # Examples
///
/// ```
/// use dlinalg::{Axis, Matrix};
///
/// let m = Matrix::wrap(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
///
/// assert_eq!(m.sum_axis(Axis::Rows).to_vec(), vec![5.0, 7.0, 9.0]);
/// assert_eq!(m.sum_axis(Axis::Cols).to_vec(), vec![6.0, 15.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Down each column: one value per column
    Rows,
    /// Along each row: one value per row
    Cols,
}

impl Matrix {
    /// Number of values an operation along `axis` produces or consumes
    fn axis_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Rows => self.cols(),
            Axis::Cols => self.rows(),
        }
    }

    /// Column `k` for [`Axis::Rows`], row `k` for [`Axis::Cols`]
    fn axis_line(&self, axis: Axis, k: usize) -> Vector {
        match axis {
            Axis::Rows => self.line_view(self.layout.col(k)),
            Axis::Cols => self.line_view(self.layout.row(k)),
        }
    }

    fn axis_vector(&self, values: Vec<f64>) -> Vector {
        let size = values.len();
        Vector::from_parts(
            Storage::from_vec(values),
            VectorLayout::Dense { offset: 0, size },
            self.backend,
        )
    }

    fn reduce_axis(&self, axis: Axis, f: impl Fn(&Vector) -> f64) -> Vector {
        let values = (0..self.axis_len(axis))
            .map(|k| f(&self.axis_line(axis, k)))
            .collect();
        self.axis_vector(values)
    }

    fn try_reduce_axis<T>(&self, axis: Axis, f: impl Fn(&Vector) -> Result<T>) -> Result<Vec<T>> {
        (0..self.axis_len(axis))
            .map(|k| f(&self.axis_line(axis, k)))
            .collect()
    }

    /// `self op v` with `v` repeated along `axis`
    ///
    /// The length is checked before any write. An operand over this buffer
    /// is copied first so every line sees its original values.
    fn broadcast(&mut self, v: &Vector, axis: Axis, op: BinaryOp) -> Result<&mut Self> {
        let expected = self.axis_len(axis);
        if v.len() != expected {
            return Err(LinalgError::mismatch(op.name(), expected, v.len()));
        }
        match axis {
            Axis::Rows => {
                let operand = if self.storage.same_buffer(v.storage()) {
                    v.copy()
                } else {
                    v.view()
                };
                for r in 0..self.rows() {
                    self.line_view(self.layout.row(r)).combine(&operand, Some(op))?;
                }
            }
            Axis::Cols => {
                for (r, x) in v.to_vec().into_iter().enumerate() {
                    self.line_view(self.layout.row(r)).binary_scalar(op, x);
                }
            }
        }
        Ok(self)
    }

    /// Sums along `axis`
    pub fn sum_axis(&self, axis: Axis) -> Vector {
        self.reduce_axis(axis, Vector::sum)
    }

    /// Means along `axis`; NaN for lines with no elements
    pub fn mean_axis(&self, axis: Axis) -> Vector {
        self.reduce_axis(axis, Vector::mean)
    }

    /// Sample variance of all elements; NaN for fewer than two elements
    pub fn variance(&self) -> f64 {
        self.axis_vector(self.to_row_major_vec()).variance()
    }

    /// Sample variances along `axis`
    pub fn variance_axis(&self, axis: Axis) -> Vector {
        self.reduce_axis(axis, Vector::variance)
    }

    /// Sample standard deviation of all elements
    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Sample standard deviations along `axis`
    pub fn sd_axis(&self, axis: Axis) -> Vector {
        let mut sd = self.variance_axis(axis);
        sd.sqrt();
        sd
    }

    /// Largest non-NaN value of each line along `axis`
    ///
    /// # Errors
    ///
    /// [`LinalgError::EmptyVector`] when the lines have no elements.
    pub fn amax(&self, axis: Axis) -> Result<Vector> {
        Ok(self.axis_vector(self.try_reduce_axis(axis, Vector::max)?))
    }

    /// Smallest non-NaN value of each line along `axis`
    pub fn amin(&self, axis: Axis) -> Result<Vector> {
        Ok(self.axis_vector(self.try_reduce_axis(axis, Vector::min)?))
    }

    /// Index within each line of its first largest non-NaN value
    pub fn argmax(&self, axis: Axis) -> Result<Vec<usize>> {
        self.try_reduce_axis(axis, Vector::argmax)
    }

    /// Index within each line of its first smallest non-NaN value
    pub fn argmin(&self, axis: Axis) -> Result<Vec<usize>> {
        self.try_reduce_axis(axis, Vector::argmin)
    }

    /// Scatter matrix `Σ (x_k - m)(x_k - m)ᵀ` over the rows `x_k`
    ///
    /// `m` holds the column means. The result is `cols × cols`; dividing it
    /// by `rows - 1` gives the sample covariance.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Matrix;
    ///
    /// let m = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 6.0]).unwrap();
    /// let s = m.scatter().unwrap();
    ///
    /// assert_eq!(s.to_row_major_vec(), vec![2.0, 4.0, 4.0, 8.0]);
    /// ```
    pub fn scatter(&self) -> Result<Matrix> {
        let means = self.mean_axis(Axis::Rows);
        let mut centered = self.copy();
        centered.sub_vec(&means, Axis::Rows)?;
        centered.t().matmul(&centered)
    }
}

/// In-place arithmetic with a vector broadcast along an axis
macro_rules! broadcast_methods {
    ($($name:ident => $op:ident;)*) => {
        impl Matrix {
            $(
                #[doc = concat!("Elementwise `", stringify!($op), "` with `v` repeated along `axis`, in place")]
                ///
                /// `v` has one value per column for [`Axis::Rows`] and one
                /// value per row for [`Axis::Cols`].
                ///
                /// # Errors
                ///
                /// [`LinalgError::DimensionMismatch`] for any other length.
                pub fn $name(&mut self, v: &Vector, axis: Axis) -> Result<&mut Self> {
                    self.broadcast(v, axis, BinaryOp::$op)
                }
            )*
        }
    };
}

broadcast_methods! {
    add_vec => Add;
    sub_vec => Sub;
    mul_vec => Mul;
    div_vec => Div;
}
