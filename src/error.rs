//! Error types for dlinalg operations

use thiserror::Error;

use crate::Backend;

/// Result type for dlinalg operations
pub type Result<T> = std::result::Result<T, LinalgError>;

/// Errors that can occur during vector and matrix operations
///
/// Every variant is reported synchronously to the direct caller, before any
/// element of the destination has been written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinalgError {
    /// Operand sizes or shapes are incompatible
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Operation that detected the mismatch
        context: &'static str,
        /// Size required by the receiver
        expected: usize,
        /// Size supplied by the operand
        actual: usize,
    },

    /// A requested range, index list or vector collection is empty or degenerate
    #[error("Out of range construction: {0}")]
    OutOfRangeConstruction(String),

    /// One or more partitions of a parallel computation failed
    #[error("{failed} of {partitions} partitions failed; first failure: {first}")]
    AggregatedTaskFailure {
        /// Number of failed partitions
        failed: usize,
        /// Total number of partitions
        partitions: usize,
        /// Message of the lowest-indexed failed partition
        first: String,
    },

    /// Backend not supported on this CPU
    #[error("Backend not supported on this platform: {0:?}")]
    UnsupportedBackend(Backend),

    /// Reduction that needs at least one element was called on an empty vector
    #[error("Empty vector")]
    EmptyVector,

    /// Invalid argument that is not a shape problem
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LinalgError {
    pub(crate) fn mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        LinalgError::DimensionMismatch {
            context,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error() {
        let err = LinalgError::mismatch("add", 10, 5);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in add: expected 10, got 5"
        );
    }

    #[test]
    fn test_out_of_range_construction_error() {
        let err = LinalgError::OutOfRangeConstruction("empty row index list".to_string());
        assert_eq!(
            err.to_string(),
            "Out of range construction: empty row index list"
        );
    }

    #[test]
    fn test_aggregated_task_failure_error() {
        let err = LinalgError::AggregatedTaskFailure {
            failed: 2,
            partitions: 8,
            first: "partition 3 panicked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "2 of 8 partitions failed; first failure: partition 3 panicked"
        );
    }

    #[test]
    fn test_unsupported_backend_error() {
        let err = LinalgError::UnsupportedBackend(Backend::AVX512);
        assert_eq!(
            err.to_string(),
            "Backend not supported on this platform: AVX512"
        );
    }

    #[test]
    fn test_empty_vector_error() {
        assert_eq!(LinalgError::EmptyVector.to_string(), "Empty vector");
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            LinalgError::mismatch("dot", 3, 4),
            LinalgError::mismatch("dot", 3, 4)
        );
        assert_ne!(
            LinalgError::mismatch("dot", 3, 4),
            LinalgError::mismatch("dot", 4, 3)
        );
    }
}
