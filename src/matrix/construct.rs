//! Matrix factories
//!
//! Every import validates the declared shape against the data it is given
//! before allocating the result.

use super::Matrix;
use crate::error::{LinalgError, Result};
use crate::layout::{MatrixLayout, Orientation};
use crate::source::{Sampler, TabularSource, ValueGenerator};
use crate::storage::Storage;
use crate::vector::Vector;
use crate::Backend;

/// Rectangular sub-range `[row_start, row_end) × [col_start, col_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRange {
    /// First row, inclusive
    pub row_start: usize,
    /// Last row, exclusive
    pub row_end: usize,
    /// First column, inclusive
    pub col_start: usize,
    /// Last column, exclusive
    pub col_end: usize,
}

impl CopyRange {
    /// Range over the given rows and columns
    pub fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        CopyRange {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Whole `rows × cols` shape
    pub fn full(rows: usize, cols: usize) -> Self {
        CopyRange::new(0, rows, 0, cols)
    }

    /// Number of selected rows
    pub fn rows(&self) -> usize {
        self.row_end.saturating_sub(self.row_start)
    }

    /// Number of selected columns
    pub fn cols(&self) -> usize {
        self.col_end.saturating_sub(self.col_start)
    }

    fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        if self.row_start >= self.row_end
            || self.row_end > rows
            || self.col_start >= self.col_end
            || self.col_end > cols
        {
            return Err(LinalgError::OutOfRangeConstruction(format!(
                "range rows [{}, {}) cols [{}, {}) is empty or exceeds {rows}x{cols}",
                self.row_start, self.row_end, self.col_start, self.col_end
            )));
        }
        Ok(())
    }
}

impl Matrix {
    /// `rows × cols` zeros, row-major
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix::fill(rows, cols, 0.0)
    }

    /// Same as [`zeros`](Self::zeros)
    pub fn empty(rows: usize, cols: usize) -> Self {
        Matrix::zeros(rows, cols)
    }

    /// `rows × cols` copies of `value`
    pub fn fill(rows: usize, cols: usize, value: f64) -> Self {
        Matrix::from_parts_dense(rows, cols, vec![value; rows * cols], Backend::select_best())
    }

    /// Element `(r, c)` is `f(r, c)`
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(f(r, c));
            }
        }
        Matrix::from_parts_dense(rows, cols, values, Backend::select_best())
    }

    /// `n × n` identity
    pub fn eye(n: usize) -> Self {
        Matrix::from_fn(n, n, |r, c| if r == c { 1.0 } else { 0.0 })
    }

    /// Square matrix with `v` on the main diagonal
    pub fn diagonal(v: &Vector) -> Self {
        let d = v.to_vec();
        Matrix::from_fn(d.len(), d.len(), |r, c| if r == c { d[r] } else { 0.0 })
    }

    /// Standard normal values from this thread's generator
    pub fn random(rows: usize, cols: usize) -> Self {
        Matrix::random_with(rows, cols, &mut Sampler::standard_normal())
    }

    /// Reproducible standard normal values
    pub fn random_seeded(rows: usize, cols: usize, seed: u64) -> Self {
        Matrix::random_with(rows, cols, &mut Sampler::standard_normal_seeded(seed))
    }

    /// Values drawn from `generator` in row-major order
    pub fn random_with(rows: usize, cols: usize, generator: &mut impl ValueGenerator) -> Self {
        Matrix::from_fn(rows, cols, |_, _| generator.sample_next())
    }

    /// Zero-copy row-major matrix over `values`
    ///
    /// # Errors
    ///
    /// [`LinalgError::DimensionMismatch`] when `values.len() != rows * cols`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Matrix;
    ///
    /// let m = Matrix::wrap(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.get(1, 0), 3.0);
    /// assert!(Matrix::wrap(2, 2, vec![1.0]).is_err());
    /// ```
    pub fn wrap(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        check_data_len("wrap", rows, cols, values.len())?;
        Ok(Matrix::from_parts_dense(rows, cols, values, Backend::select_best()))
    }

    /// Zero-copy row-major view into part of a shared buffer
    ///
    /// Row `r` starts at `offset + r * row_stride`; a stride larger than `cols`
    /// makes the matrix a sub-block of a wider one.
    pub fn wrap_storage(
        storage: Storage,
        offset: usize,
        rows: usize,
        cols: usize,
        row_stride: usize,
    ) -> Result<Self> {
        if rows > 1 && row_stride < cols {
            return Err(LinalgError::OutOfRangeConstruction(format!(
                "row stride {row_stride} is smaller than {cols} columns"
            )));
        }
        let layout = MatrixLayout::row_major(offset, rows, cols, row_stride);
        layout.validate(storage.len())?;
        Ok(Matrix::from_parts(storage, layout, Backend::select_best()))
    }

    /// Copy of a flat buffer laid out in `orientation`
    ///
    /// Column-major input keeps a column-major layout.
    pub fn from_flat(rows: usize, cols: usize, orientation: Orientation, values: &[f64]) -> Result<Self> {
        check_data_len("from_flat", rows, cols, values.len())?;
        let layout = match orientation {
            Orientation::RowMajor => MatrixLayout::row_major(0, rows, cols, cols),
            Orientation::ColMajor => MatrixLayout::col_major(0, rows, cols, rows),
        };
        Ok(Matrix::from_parts(
            Storage::from_vec(values.to_vec()),
            layout,
            Backend::select_best(),
        ))
    }

    /// Copy of the `range` sub-block of an `input_rows × input_cols` flat buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::{CopyRange, Matrix, Orientation};
    ///
    /// let values: Vec<f64> = (0..12).map(f64::from).collect();
    /// let m = Matrix::from_flat_range(3, 4, CopyRange::new(1, 3, 1, 3), Orientation::RowMajor, &values)
    ///     .unwrap();
    /// assert_eq!(m.to_row_major_vec(), vec![5.0, 6.0, 9.0, 10.0]);
    /// ```
    pub fn from_flat_range(
        input_rows: usize,
        input_cols: usize,
        range: CopyRange,
        orientation: Orientation,
        values: &[f64],
    ) -> Result<Self> {
        check_data_len("from_flat_range", input_rows, input_cols, values.len())?;
        range.validate(input_rows, input_cols)?;
        let at = |r: usize, c: usize| match orientation {
            Orientation::RowMajor => values[input_cols * r + c],
            Orientation::ColMajor => values[input_rows * c + r],
        };
        Ok(Matrix::from_fn(range.rows(), range.cols(), |i, j| {
            at(range.row_start + i, range.col_start + j)
        }))
    }

    /// Copy of nested vectors, each one a row or a column per `orientation`
    ///
    /// # Errors
    ///
    /// [`LinalgError::OutOfRangeConstruction`] for no vectors or empty ones,
    /// [`LinalgError::DimensionMismatch`] for ragged input.
    pub fn from_nested(values: &[Vec<f64>], orientation: Orientation) -> Result<Self> {
        let (rows, cols) = nested_shape(values, orientation)?;
        Matrix::from_nested_range(values, orientation, CopyRange::full(rows, cols))
    }

    /// Copy of the `range` sub-block of nested vectors
    pub fn from_nested_range(values: &[Vec<f64>], orientation: Orientation, range: CopyRange) -> Result<Self> {
        let (rows, cols) = nested_shape(values, orientation)?;
        range.validate(rows, cols)?;
        let at = |r: usize, c: usize| match orientation {
            Orientation::RowMajor => values[r][c],
            Orientation::ColMajor => values[c][r],
        };
        Ok(Matrix::from_fn(range.rows(), range.cols(), |i, j| {
            at(range.row_start + i, range.col_start + j)
        }))
    }

    /// Bind vectors as rows (`RowMajor`) or columns (`ColMajor`)
    ///
    /// Vectors longer than the shortest one are truncated to its length.
    ///
    /// # Errors
    ///
    /// [`LinalgError::OutOfRangeConstruction`] when there are no vectors or the
    /// shortest one is empty.
    pub fn from_vectors(orientation: Orientation, vectors: &[Vector]) -> Result<Self> {
        let len = vectors.iter().map(Vector::len).min().unwrap_or(0);
        if len == 0 {
            return Err(LinalgError::OutOfRangeConstruction(format!(
                "cannot bind {} vectors with minimum length 0",
                vectors.len()
            )));
        }
        let lines: Vec<Vec<f64>> = vectors.iter().map(Vector::to_vec).collect();
        Ok(match orientation {
            Orientation::RowMajor => Matrix::from_fn(lines.len(), len, |r, c| lines[r][c]),
            Orientation::ColMajor => Matrix::from_fn(len, lines.len(), |r, c| lines[c][r]),
        })
    }

    /// Copy of every cell of a table
    pub fn from_table(source: &impl TabularSource) -> Self {
        Matrix::from_fn(source.row_count(), source.col_count(), |r, c| {
            source.get_double(r, c)
        })
    }
}

fn check_data_len(context: &'static str, rows: usize, cols: usize, len: usize) -> Result<()> {
    if rows * cols != len {
        return Err(LinalgError::mismatch(context, rows * cols, len));
    }
    Ok(())
}

fn nested_shape(values: &[Vec<f64>], orientation: Orientation) -> Result<(usize, usize)> {
    let inner = values.first().map_or(0, Vec::len);
    if inner == 0 {
        return Err(LinalgError::OutOfRangeConstruction(
            "nested input has no values".to_string(),
        ));
    }
    if let Some(ragged) = values.iter().find(|v| v.len() != inner) {
        return Err(LinalgError::mismatch("from_nested", inner, ragged.len()));
    }
    Ok(match orientation {
        Orientation::RowMajor => (values.len(), inner),
        Orientation::ColMajor => (inner, values.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table {
        rows: usize,
        cols: usize,
    }

    impl TabularSource for Table {
        fn row_count(&self) -> usize {
            self.rows
        }
        fn col_count(&self) -> usize {
            self.cols
        }
        fn get_double(&self, row: usize, col: usize) -> f64 {
            (row * 100 + col) as f64
        }
    }

    #[test]
    fn test_eye_and_diagonal() {
        let eye = Matrix::eye(3);
        assert_eq!(eye.trace().unwrap(), 3.0);
        assert_eq!(eye.get(0, 1), 0.0);

        let d = Matrix::diagonal(&Vector::from_slice(&[2.0, 5.0]));
        assert_eq!(d.to_row_major_vec(), vec![2.0, 0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_fill_and_random() {
        assert_eq!(Matrix::fill(2, 2, 3.0).sum(), 12.0);
        assert_eq!(Matrix::empty(2, 3).shape(), (2, 3));

        let a = Matrix::random_seeded(3, 4, 9);
        let b = Matrix::random_seeded(3, 4, 9);
        assert!(a.deep_equals(&b, 0.0));
        assert_eq!(Matrix::random(2, 2).shape(), (2, 2));

        let mut k = 0.0;
        let c = Matrix::random_with(2, 2, &mut || {
            k += 1.0;
            k
        });
        assert_eq!(c.to_row_major_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_wrap_storage_sub_block() {
        let storage = Storage::from_vec((0..12).map(f64::from).collect());
        let m = Matrix::wrap_storage(storage.clone(), 1, 2, 2, 4).unwrap();
        assert_eq!(m.to_row_major_vec(), vec![1.0, 2.0, 5.0, 6.0]);
        assert!(m.layout().row_major_run().is_none());

        assert!(Matrix::wrap_storage(storage.clone(), 0, 3, 4, 3).is_err());
        assert!(Matrix::wrap_storage(storage, 8, 2, 4, 4).is_err());
    }

    #[test]
    fn test_from_flat_orientations() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let rm = Matrix::from_flat(2, 3, Orientation::RowMajor, &values).unwrap();
        let cm = Matrix::from_flat(2, 3, Orientation::ColMajor, &values).unwrap();
        assert_eq!(rm.get(1, 0), 4.0);
        assert_eq!(cm.get(1, 0), 2.0);
        assert_eq!(cm.layout().orientation(), Some(Orientation::ColMajor));
        assert_eq!(
            Matrix::from_flat(2, 2, Orientation::RowMajor, &values).unwrap_err(),
            LinalgError::DimensionMismatch {
                context: "from_flat",
                expected: 4,
                actual: 6
            }
        );
    }

    #[test]
    fn test_from_flat_range_col_major() {
        // 3x4 column-major: element (r, c) = 3c + r
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let m = Matrix::from_flat_range(3, 4, CopyRange::new(0, 2, 2, 4), Orientation::ColMajor, &values)
            .unwrap();
        assert_eq!(m.to_row_major_vec(), vec![6.0, 9.0, 7.0, 10.0]);

        assert!(Matrix::from_flat_range(3, 4, CopyRange::new(2, 2, 0, 1), Orientation::RowMajor, &values)
            .is_err());
        assert!(Matrix::from_flat_range(3, 4, CopyRange::new(0, 4, 0, 1), Orientation::RowMajor, &values)
            .is_err());
    }

    #[test]
    fn test_from_nested() {
        let nested = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let by_rows = Matrix::from_nested(&nested, Orientation::RowMajor).unwrap();
        assert_eq!(by_rows.shape(), (2, 3));
        let by_cols = Matrix::from_nested(&nested, Orientation::ColMajor).unwrap();
        assert_eq!(by_cols.shape(), (3, 2));
        assert_eq!(by_cols.get(2, 1), 6.0);

        let part = Matrix::from_nested_range(&nested, Orientation::RowMajor, CopyRange::new(1, 2, 0, 2)).unwrap();
        assert_eq!(part.to_row_major_vec(), vec![4.0, 5.0]);

        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            Matrix::from_nested(&ragged, Orientation::RowMajor),
            Err(LinalgError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Matrix::from_nested(&[], Orientation::RowMajor),
            Err(LinalgError::OutOfRangeConstruction(_))
        ));
    }

    #[test]
    fn test_from_vectors_uses_min_length() {
        let vs = [
            Vector::from_slice(&[1.0, 2.0, 3.0]),
            Vector::from_slice(&[4.0, 5.0]),
        ];
        let rows = Matrix::from_vectors(Orientation::RowMajor, &vs).unwrap();
        assert_eq!(rows.to_row_major_vec(), vec![1.0, 2.0, 4.0, 5.0]);
        let cols = Matrix::from_vectors(Orientation::ColMajor, &vs).unwrap();
        assert_eq!(cols.to_row_major_vec(), vec![1.0, 4.0, 2.0, 5.0]);

        let with_empty = [Vector::from_slice(&[1.0]), Vector::zeros(0)];
        assert!(matches!(
            Matrix::from_vectors(Orientation::ColMajor, &with_empty),
            Err(LinalgError::OutOfRangeConstruction(_))
        ));
        assert!(Matrix::from_vectors(Orientation::RowMajor, &[]).is_err());
    }

    #[test]
    fn test_from_table() {
        let m = Matrix::from_table(&Table { rows: 2, cols: 3 });
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), 102.0);
    }
}
