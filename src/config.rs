//! Tuning knobs for partitioned multiplication
//!
//! Chunk sizes are fixed tuning constants, not derived from the thread count:
//! the same configuration always produces the same partitions, so results do
//! not depend on how many workers happen to be available.

use crate::error::{LinalgError, Result};
use crate::Backend;

/// Output rows computed by one matrix×vector task
pub const DEFAULT_ROW_CHUNK: usize = 256;

/// Result columns computed by one matrix×matrix task
pub const DEFAULT_COL_CHUNK: usize = 32;

/// Execution settings for `matvec_with` / `matmul_with`
///
/// # Examples
///
/// ```
/// use dlinalg::{Backend, ComputeConfig};
///
/// let config = ComputeConfig::default()
///     .with_backend(Backend::Scalar)
///     .with_row_chunk(64)
///     .sequential();
/// assert!(config.validate().is_ok());
/// assert!(!config.parallel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeConfig {
    /// Backend running the dot-product kernels
    pub backend: Backend,
    /// Rows per matrix×vector partition
    pub row_chunk: usize,
    /// Columns per matrix×matrix partition
    pub col_chunk: usize,
    /// Run partitions on the rayon pool (ignored without the `parallel` feature)
    pub parallel: bool,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig {
            backend: Backend::select_best(),
            row_chunk: DEFAULT_ROW_CHUNK,
            col_chunk: DEFAULT_COL_CHUNK,
            parallel: true,
        }
    }
}

impl ComputeConfig {
    /// Use `backend` for the kernels
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Rows per matrix×vector partition
    pub fn with_row_chunk(mut self, rows: usize) -> Self {
        self.row_chunk = rows;
        self
    }

    /// Columns per matrix×matrix partition
    pub fn with_col_chunk(mut self, cols: usize) -> Self {
        self.col_chunk = cols;
        self
    }

    /// Run every partition on the calling thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Reject zero chunk sizes and backends this CPU cannot run
    pub fn validate(&self) -> Result<()> {
        if self.row_chunk == 0 {
            return Err(LinalgError::InvalidInput(
                "row_chunk must be at least 1".to_string(),
            ));
        }
        if self.col_chunk == 0 {
            return Err(LinalgError::InvalidInput(
                "col_chunk must be at least 1".to_string(),
            ));
        }
        if !self.backend.is_available() {
            return Err(LinalgError::UnsupportedBackend(self.backend));
        }
        Ok(())
    }
}
