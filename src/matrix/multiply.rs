//! Block-parallel multiplication
//!
//! Both products split their output into fixed-size partitions (see
//! [`ComputeConfig`]) and compute every partition independently:
//!
//! - matrix×vector: chunks of output rows, each a run of row·vector dot products
//! - matrix×matrix: chunks of result columns, stored column-major, each column
//!   a run of row·column dot products against one extracted column of `B`
//!
//! Partitions write disjoint slices of one output buffer and only read the
//! operands, so they need no synchronization beyond the final join.

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Matrix;
use crate::config::ComputeConfig;
use crate::dispatch::{self, Kernel};
use crate::error::{LinalgError, Result};
use crate::layout::{MatrixLayout, Orientation, VectorLayout};
use crate::parallel::run_partitioned;
use crate::storage::Storage;
use crate::vector::Vector;

/// How the rows of the left operand are read
enum RowSource<'a> {
    /// Each row is a contiguous slice
    Contiguous {
        buf: &'a [f64],
        offset: usize,
        row_stride: usize,
        len: usize,
    },
    /// Any other layout, read element by element
    Indexed {
        buf: &'a [f64],
        layout: &'a MatrixLayout,
    },
}

impl<'a> RowSource<'a> {
    fn new(buf: &'a [f64], layout: &'a MatrixLayout) -> Self {
        match *layout {
            MatrixLayout::Dense {
                offset,
                cols,
                row_stride,
                col_stride,
                ..
            } if col_stride == 1 || cols <= 1 => RowSource::Contiguous {
                buf,
                offset,
                row_stride,
                len: cols,
            },
            _ => RowSource::Indexed { buf, layout },
        }
    }

    fn is_contiguous(&self) -> bool {
        matches!(self, RowSource::Contiguous { .. })
    }

    /// Dot product of row `row` with `x`
    fn row_dot(&self, kernel: Kernel, row: usize, x: &[f64]) -> f64 {
        match *self {
            RowSource::Contiguous {
                buf,
                offset,
                row_stride,
                len,
            } => {
                let start = offset + row * row_stride;
                kernel.dot(&buf[start..start + len], x)
            }
            RowSource::Indexed { buf, layout } => x
                .iter()
                .enumerate()
                .fold(0.0, |acc, (c, &xc)| buf[layout.position(row, c)].mul_add(xc, acc)),
        }
    }
}

impl Matrix {
    /// `self · v` with the default [`ComputeConfig`]
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::{Matrix, Vector};
    ///
    /// let a = Matrix::wrap(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let v = Vector::from_slice(&[1.0, 0.0, 1.0]);
    /// assert_eq!(a.matvec(&v).unwrap().to_vec(), vec![4.0, 10.0]);
    /// ```
    pub fn matvec(&self, v: &Vector) -> Result<Vector> {
        self.matvec_with(v, &self.default_config())
    }

    /// Same as [`matvec`](Self::matvec)
    pub fn dot_vector(&self, v: &Vector) -> Result<Vector> {
        self.matvec(v)
    }

    /// `self · v` with explicit partitioning and backend
    ///
    /// A non-contiguous `v` is copied into a flat buffer once before the
    /// row loops start. Output rows are split into `config.row_chunk` pieces.
    ///
    /// # Errors
    ///
    /// - [`LinalgError::DimensionMismatch`] when `cols(self) != len(v)`
    /// - [`LinalgError::AggregatedTaskFailure`] when a partition fails
    /// - [`LinalgError::InvalidInput`] / [`LinalgError::UnsupportedBackend`]
    ///   for an invalid configuration
    #[cfg_attr(
        feature = "tracing",
        instrument(skip(self, v, config), fields(rows = self.rows(), cols = self.cols()))
    )]
    pub fn matvec_with(&self, v: &Vector, config: &ComputeConfig) -> Result<Vector> {
        config.validate()?;
        if self.cols() != v.len() {
            return Err(LinalgError::mismatch("matvec", self.cols(), v.len()));
        }
        let kernel = Kernel::for_backend(config.backend);
        let mut out = vec![0.0; self.rows()];

        let compute = |a: &[f64], x: &[f64], out: &mut [f64]| {
            let rows = RowSource::new(a, &self.layout);
            if !rows.is_contiguous() {
                dispatch::trace_generic("matvec", self.rows() * self.cols());
            }
            run_partitioned(out, config.row_chunk, config.parallel, |chunk, slice| {
                let first = chunk * config.row_chunk;
                for (k, o) in slice.iter_mut().enumerate() {
                    *o = rows.row_dot(kernel, first + k, x);
                }
                Ok(())
            })
        };

        match v.layout().dense_run() {
            Some(run) => Storage::with_read_pair(&self.storage, v.storage(), |a, b| {
                compute(a, &b[run.range()], &mut out)
            })?,
            None => {
                let x = v.to_vec();
                let a = self.storage.read();
                compute(&a[..], &x, &mut out)?
            }
        }

        let size = out.len();
        Ok(Vector::from_parts(
            Storage::from_vec(out),
            VectorLayout::Dense { offset: 0, size },
            self.backend,
        ))
    }

    /// `self · b` with the default [`ComputeConfig`]
    ///
    /// The result is stored column-major; read it through `get`, `t()` or
    /// `copy()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Matrix;
    ///
    /// let a = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// let b = Matrix::wrap(2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
    /// let c = a.matmul(&b).unwrap();
    /// assert_eq!(c.to_row_major_vec(), vec![2.0, 1.0, 4.0, 3.0]);
    /// ```
    pub fn matmul(&self, b: &Matrix) -> Result<Matrix> {
        self.matmul_with(b, &self.default_config())
    }

    /// Same as [`matmul`](Self::matmul)
    pub fn dot_matrix(&self, b: &Matrix) -> Result<Matrix> {
        self.matmul(b)
    }

    /// `self · b` with explicit partitioning and backend
    ///
    /// Result columns are split into `config.col_chunk` pieces. Each column
    /// of `b` is extracted once per partition and dotted with every row of
    /// `self`. Row-major `self` is read in place, column-major `self` is
    /// copied to row-major once, and mapped `self` falls back to element
    /// access.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            skip(self, b, config),
            fields(dims = %format!("{}x{} @ {}x{}", self.rows(), self.cols(), b.rows(), b.cols()))
        )
    )]
    pub fn matmul_with(&self, b: &Matrix, config: &ComputeConfig) -> Result<Matrix> {
        config.validate()?;
        if self.cols() != b.rows() {
            return Err(LinalgError::mismatch("matmul", self.cols(), b.rows()));
        }
        let (n, p) = (self.rows(), b.cols());
        if n == 0 || p == 0 || self.cols() == 0 {
            return Ok(Matrix::zeros(n, p).with_backend_unchecked(self.backend));
        }
        let kernel = Kernel::for_backend(config.backend);
        let mut out = vec![0.0; n * p];

        match self.layout.orientation() {
            Some(Orientation::ColMajor) if self.cols() > 1 => {
                let row_major = self.to_row_major_vec();
                let layout = MatrixLayout::row_major(0, n, self.cols(), self.cols());
                let bbuf = b.storage.read();
                let rows = RowSource::new(&row_major, &layout);
                column_products(&rows, &b.layout, &bbuf[..], n, kernel, config, &mut out)?;
            }
            _ => Storage::with_read_pair(&self.storage, &b.storage, |a, bbuf| {
                let rows = RowSource::new(a, &self.layout);
                if !rows.is_contiguous() {
                    dispatch::trace_generic("matmul", n * p * self.cols());
                }
                column_products(&rows, &b.layout, bbuf, n, kernel, config, &mut out)
            })?,
        }

        Ok(Matrix::from_parts(
            Storage::from_vec(out),
            MatrixLayout::col_major(0, n, p, n),
            self.backend,
        ))
    }

    fn default_config(&self) -> ComputeConfig {
        ComputeConfig {
            backend: self.backend,
            ..ComputeConfig::default()
        }
    }
}

/// Fills column-major `out` (`n` rows) with `rows · column(b, j)`
fn column_products(
    rows: &RowSource<'_>,
    b_layout: &MatrixLayout,
    bbuf: &[f64],
    n: usize,
    kernel: Kernel,
    config: &ComputeConfig,
    out: &mut [f64],
) -> Result<()> {
    // A chunk wider than the result is one partition
    let chunk_len = config.col_chunk.saturating_mul(n);
    run_partitioned(out, chunk_len, config.parallel, |chunk, block| {
        let first_col = chunk * config.col_chunk;
        for (jj, col_out) in block.chunks_mut(n).enumerate() {
            let col_layout = b_layout.col(first_col + jj);
            let extracted: Vec<f64>;
            let col: &[f64] = match col_layout.dense_run() {
                Some(run) => &bbuf[run.range()],
                None => {
                    extracted = col_layout.positions().map(|q| bbuf[q]).collect();
                    &extracted
                }
            };
            for (i, o) in col_out.iter_mut().enumerate() {
                *o = rows.row_dot(kernel, i, col);
            }
        }
        Ok(())
    })
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn test_identity_matvec(n in 1usize..40, seed in any::<u64>()) {
            let v = Vector::random_seeded(n, seed);
            let r = Matrix::eye(n).matvec(&v).unwrap();
            prop_assert_eq!(r.to_vec(), v.to_vec());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn test_matmul_transpose_identity(
            n in 1usize..10,
            k in 1usize..10,
            p in 1usize..10,
            seed in any::<u64>()
        ) {
            // (A·B)ᵗ = Bᵗ·Aᵗ
            let a = Matrix::random_seeded(n, k, seed);
            let b = Matrix::random_seeded(k, p, seed.wrapping_add(1));
            let left = a.matmul(&b).unwrap().t();
            let right = b.t().matmul(&a.t()).unwrap();
            prop_assert!(left.deep_equals(&right, 1e-9));
        }
    }
}
