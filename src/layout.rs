//! View addressing over a flat buffer
//!
//! A layout maps logical indices to buffer positions. It holds no values and
//! can be shared freely; creating a view is creating a layout.
//!
//! Vector layouts come in exactly three shapes: dense (`offset + i`), strided
//! (`offset + i * stride`) and index-mapped (`offset + indices[i]`). Matrix
//! layouts are either dense with a row and a column stride (row-major when the
//! column stride is 1, column-major when the row stride is 1) or mapped with
//! explicit per-row and per-column offsets.

use std::ops::Range;
use std::sync::Arc;

use crate::error::{LinalgError, Result};

/// One contiguous run of buffer positions
///
/// Returned by the capability queries; holding one means the vectorized path
/// may work on `buffer[offset..offset + len]` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseRun {
    /// First buffer position
    pub offset: usize,
    /// Number of values
    pub len: usize,
}

impl DenseRun {
    /// Buffer positions covered by the run
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Storage order of a dense matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Consecutive values belong to the same row
    RowMajor,
    /// Consecutive values belong to the same column
    ColMajor,
}

impl Orientation {
    /// The other orientation
    pub fn flip(self) -> Self {
        match self {
            Orientation::RowMajor => Orientation::ColMajor,
            Orientation::ColMajor => Orientation::RowMajor,
        }
    }
}

/// Addressing of a vector view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorLayout {
    /// `offset + i`
    Dense {
        /// Position of element 0
        offset: usize,
        /// Number of elements
        size: usize,
    },
    /// `offset + i * stride`
    Strided {
        /// Position of element 0
        offset: usize,
        /// Distance between consecutive elements
        stride: usize,
        /// Number of elements
        size: usize,
    },
    /// `offset + indices[i]`
    Mapped {
        /// Base position added to every index
        offset: usize,
        /// Per-element index relative to `offset`
        indices: Arc<[usize]>,
    },
}

impl VectorLayout {
    /// Number of logical elements
    pub fn len(&self) -> usize {
        match self {
            VectorLayout::Dense { size, .. } | VectorLayout::Strided { size, .. } => *size,
            VectorLayout::Mapped { indices, .. } => indices.len(),
        }
    }

    /// True when the view has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer position of logical element `i`
    #[inline]
    pub fn position(&self, i: usize) -> usize {
        match self {
            VectorLayout::Dense { offset, .. } => offset + i,
            VectorLayout::Strided { offset, stride, .. } => offset + i * stride,
            VectorLayout::Mapped { offset, indices } => offset + indices[i],
        }
    }

    /// Buffer positions of every element, in logical order
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |i| self.position(i))
    }

    /// Capability query: the contiguous run this view covers, if it is one
    pub fn dense_run(&self) -> Option<DenseRun> {
        match *self {
            VectorLayout::Dense { offset, size } => Some(DenseRun { offset, len: size }),
            VectorLayout::Strided {
                offset,
                stride,
                size,
            } if stride == 1 || size <= 1 => Some(DenseRun { offset, len: size }),
            _ => None,
        }
    }

    /// Largest buffer position addressed, `None` for an empty view
    pub fn max_position(&self) -> Option<usize> {
        match self {
            VectorLayout::Dense { .. } | VectorLayout::Strided { .. } => {
                self.len().checked_sub(1).map(|last| self.position(last))
            }
            VectorLayout::Mapped { offset, indices } => indices.iter().max().map(|m| offset + m),
        }
    }

    /// Check that every position lies inside a buffer of `buffer_len` values
    pub fn validate(&self, buffer_len: usize) -> Result<()> {
        match self.max_position() {
            Some(max) if max >= buffer_len => Err(LinalgError::OutOfRangeConstruction(format!(
                "view addresses position {max} of a buffer with {buffer_len} values"
            ))),
            _ => Ok(()),
        }
    }

    /// Sub-view of the elements at `indices`
    ///
    /// Collapses to a dense layout when the selected positions are consecutive.
    pub fn map(&self, indices: &[usize]) -> Result<VectorLayout> {
        check_indices("vector", indices, self.len())?;
        let positions: Vec<usize> = indices.iter().map(|&i| self.position(i)).collect();
        if is_consecutive(&positions) {
            return Ok(VectorLayout::Dense {
                offset: positions[0],
                size: positions.len(),
            });
        }
        Ok(VectorLayout::Mapped {
            offset: 0,
            indices: Arc::from(positions),
        })
    }

    /// Sub-view of the elements in `[start, end)`, keeping the layout shape
    pub fn range(&self, start: usize, end: usize) -> Result<VectorLayout> {
        check_interval("vector", start, end, self.len())?;
        let size = end - start;
        Ok(match self {
            VectorLayout::Dense { offset, .. } => VectorLayout::Dense {
                offset: offset + start,
                size,
            },
            VectorLayout::Strided { offset, stride, .. } => VectorLayout::Strided {
                offset: offset + start * stride,
                stride: *stride,
                size,
            },
            VectorLayout::Mapped { offset, indices } => VectorLayout::Mapped {
                offset: *offset,
                indices: Arc::from(&indices[start..end]),
            },
        })
    }
}

/// Addressing of a matrix view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixLayout {
    /// Element `(r, c)` at `offset + r * row_stride + c * col_stride`
    Dense {
        /// Position of element `(0, 0)`
        offset: usize,
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
        /// Distance between consecutive rows
        row_stride: usize,
        /// Distance between consecutive columns
        col_stride: usize,
    },
    /// Element `(r, c)` at `offset + row_offsets[r] + col_offsets[c]`
    Mapped {
        /// Base position
        offset: usize,
        /// Per-row offset, already scaled by the source row stride
        row_offsets: Arc<[usize]>,
        /// Per-column offset, already scaled by the source column stride
        col_offsets: Arc<[usize]>,
    },
}

impl MatrixLayout {
    /// Row-major layout; `row_stride >= cols` leaves gaps between rows
    pub fn row_major(offset: usize, rows: usize, cols: usize, row_stride: usize) -> Self {
        MatrixLayout::Dense {
            offset,
            rows,
            cols,
            row_stride,
            col_stride: 1,
        }
    }

    /// Column-major layout; `col_stride >= rows` leaves gaps between columns
    pub fn col_major(offset: usize, rows: usize, cols: usize, col_stride: usize) -> Self {
        MatrixLayout::Dense {
            offset,
            rows,
            cols,
            row_stride: 1,
            col_stride,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        match self {
            MatrixLayout::Dense { rows, .. } => *rows,
            MatrixLayout::Mapped { row_offsets, .. } => row_offsets.len(),
        }
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        match self {
            MatrixLayout::Dense { cols, .. } => *cols,
            MatrixLayout::Mapped { col_offsets, .. } => col_offsets.len(),
        }
    }

    /// Buffer position of element `(r, c)`
    #[inline]
    pub fn position(&self, r: usize, c: usize) -> usize {
        match self {
            MatrixLayout::Dense {
                offset,
                row_stride,
                col_stride,
                ..
            } => offset + r * row_stride + c * col_stride,
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => offset + row_offsets[r] + col_offsets[c],
        }
    }

    /// Same positions with rows and columns swapped
    pub fn transpose(&self) -> Self {
        match self {
            MatrixLayout::Dense {
                offset,
                rows,
                cols,
                row_stride,
                col_stride,
            } => MatrixLayout::Dense {
                offset: *offset,
                rows: *cols,
                cols: *rows,
                row_stride: *col_stride,
                col_stride: *row_stride,
            },
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => MatrixLayout::Mapped {
                offset: *offset,
                row_offsets: col_offsets.clone(),
                col_offsets: row_offsets.clone(),
            },
        }
    }

    /// Storage order of a dense layout; `None` for mapped layouts
    pub fn orientation(&self) -> Option<Orientation> {
        match self {
            MatrixLayout::Dense { col_stride: 1, .. } => Some(Orientation::RowMajor),
            MatrixLayout::Dense { row_stride: 1, .. } => Some(Orientation::ColMajor),
            _ => None,
        }
    }

    /// Capability query: the contiguous run holding the matrix in row-major order
    pub fn row_major_run(&self) -> Option<DenseRun> {
        match *self {
            MatrixLayout::Dense {
                offset,
                rows,
                cols,
                row_stride,
                col_stride,
            } if (col_stride == 1 || cols <= 1) && (row_stride == cols || rows <= 1) => {
                Some(DenseRun {
                    offset,
                    len: rows * cols,
                })
            }
            _ => None,
        }
    }

    /// Capability query: the contiguous run holding every element, in either order
    pub fn contiguous_run(&self) -> Option<DenseRun> {
        self.row_major_run()
            .or_else(|| self.transpose().row_major_run())
    }

    /// Layout of row `r` as a vector view
    pub fn row(&self, r: usize) -> VectorLayout {
        match self {
            MatrixLayout::Dense {
                offset,
                cols,
                row_stride,
                col_stride,
                ..
            } => line(offset + r * row_stride, *col_stride, *cols),
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => VectorLayout::Mapped {
                offset: offset + row_offsets[r],
                indices: col_offsets.clone(),
            },
        }
    }

    /// Layout of column `c` as a vector view
    pub fn col(&self, c: usize) -> VectorLayout {
        self.transpose().row(c)
    }

    /// View of the rows at `indices`, in that order
    pub fn map_rows(&self, indices: &[usize]) -> Result<Self> {
        check_indices("row", indices, self.rows())?;
        if let MatrixLayout::Dense { .. } = self {
            if is_consecutive(indices) {
                return self.range_rows(indices[0], indices[0] + indices.len());
            }
        }
        let (offset, row_offsets, col_offsets) = self.offset_tables();
        let rows: Vec<usize> = indices.iter().map(|&i| row_offsets[i]).collect();
        Ok(MatrixLayout::Mapped {
            offset,
            row_offsets: Arc::from(rows),
            col_offsets,
        })
    }

    /// View of the columns at `indices`, in that order
    pub fn map_cols(&self, indices: &[usize]) -> Result<Self> {
        Ok(self.transpose().map_rows(indices)?.transpose())
    }

    /// View of the rows in `[start, end)`
    pub fn range_rows(&self, start: usize, end: usize) -> Result<Self> {
        check_interval("row", start, end, self.rows())?;
        Ok(match self {
            MatrixLayout::Dense {
                offset,
                cols,
                row_stride,
                col_stride,
                ..
            } => MatrixLayout::Dense {
                offset: offset + start * row_stride,
                rows: end - start,
                cols: *cols,
                row_stride: *row_stride,
                col_stride: *col_stride,
            },
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => MatrixLayout::Mapped {
                offset: *offset,
                row_offsets: Arc::from(&row_offsets[start..end]),
                col_offsets: col_offsets.clone(),
            },
        })
    }

    /// View of the columns in `[start, end)`
    pub fn range_cols(&self, start: usize, end: usize) -> Result<Self> {
        Ok(self.transpose().range_rows(start, end)?.transpose())
    }

    /// Largest buffer position addressed, `None` for an empty matrix
    pub fn max_position(&self) -> Option<usize> {
        if self.rows() == 0 || self.cols() == 0 {
            return None;
        }
        match self {
            MatrixLayout::Dense { rows, cols, .. } => Some(self.position(rows - 1, cols - 1)),
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => {
                let r = row_offsets.iter().max().copied().unwrap_or(0);
                let c = col_offsets.iter().max().copied().unwrap_or(0);
                Some(offset + r + c)
            }
        }
    }

    /// Check that every position lies inside a buffer of `buffer_len` values
    pub fn validate(&self, buffer_len: usize) -> Result<()> {
        match self.max_position() {
            Some(max) if max >= buffer_len => Err(LinalgError::OutOfRangeConstruction(format!(
                "{}x{} view addresses position {max} of a buffer with {buffer_len} values",
                self.rows(),
                self.cols()
            ))),
            _ => Ok(()),
        }
    }

    /// `(offset, row offsets, column offsets)` describing every position
    fn offset_tables(&self) -> (usize, Arc<[usize]>, Arc<[usize]>) {
        match self {
            MatrixLayout::Dense {
                offset,
                rows,
                cols,
                row_stride,
                col_stride,
            } => (
                *offset,
                (0..*rows).map(|r| r * row_stride).collect(),
                (0..*cols).map(|c| c * col_stride).collect(),
            ),
            MatrixLayout::Mapped {
                offset,
                row_offsets,
                col_offsets,
            } => (*offset, row_offsets.clone(), col_offsets.clone()),
        }
    }
}

fn line(offset: usize, stride: usize, size: usize) -> VectorLayout {
    if stride == 1 {
        VectorLayout::Dense { offset, size }
    } else {
        VectorLayout::Strided {
            offset,
            stride,
            size,
        }
    }
}

/// True when every value is its predecessor plus one
pub(crate) fn is_consecutive(values: &[usize]) -> bool {
    !values.is_empty() && values.windows(2).all(|w| w[1] == w[0] + 1)
}

fn check_indices(what: &str, indices: &[usize], len: usize) -> Result<()> {
    if indices.is_empty() {
        return Err(LinalgError::OutOfRangeConstruction(format!(
            "empty {what} index list"
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
        return Err(LinalgError::OutOfRangeConstruction(format!(
            "{what} index {bad} out of range for length {len}"
        )));
    }
    Ok(())
}

fn check_interval(what: &str, start: usize, end: usize, len: usize) -> Result<()> {
    if start >= end || end > len {
        return Err(LinalgError::OutOfRangeConstruction(format!(
            "{what} range [{start}, {end}) is empty or exceeds length {len}"
        )));
    }
    Ok(())
}
