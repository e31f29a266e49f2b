//! Backend implementations for different SIMD instruction sets
//!
//! This module contains the lane kernels for each backend. All backends
//! implement [`VectorBackend`] so the dispatch layer can pick one at runtime.
//!
//! # Safety
//!
//! All `unsafe` code is isolated within backend implementations. The public API
//! remains safe: the dispatch layer only calls a SIMD backend after the CPU
//! features it was compiled for have been detected.
//!
//! # Backends
//!
//! - `scalar`: Portable baseline implementation (no SIMD)
//! - `sse2`: x86_64 baseline SIMD (128-bit, 2 × f64)
//! - `avx2`: x86_64 advanced SIMD (256-bit with FMA, 4 × f64)

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod sse2;

#[cfg(target_arch = "x86_64")]
pub mod avx2;

use crate::ops::{BinaryOp, UnaryOp};

/// Backend trait defining the lane kernels
///
/// Kernels work in place on `acc`. Out-of-place operations copy the source into
/// the destination first and then run the in-place kernel there.
///
/// # Safety
///
/// Implementations may use SIMD intrinsics. Callers must ensure:
/// - The CPU supports the instruction set of the implementation
/// - Paired slices have the same length
pub trait VectorBackend {
    /// Number of `f64` values per lane operation
    const LANES: usize;

    /// `acc[i] = acc[i] op b[i]`
    ///
    /// # Safety
    ///
    /// - `acc` and `b` must have the same length
    unsafe fn binary_assign(op: BinaryOp, acc: &mut [f64], b: &[f64]);

    /// `acc[i] = acc[i] op x`
    ///
    /// # Safety
    ///
    /// - The CPU must support the backend's instruction set
    unsafe fn binary_scalar_assign(op: BinaryOp, acc: &mut [f64], x: f64);

    /// `acc[i] = op(acc[i])`
    ///
    /// # Safety
    ///
    /// - The CPU must support the backend's instruction set
    unsafe fn unary_assign(op: UnaryOp, acc: &mut [f64]);

    /// `acc[i] = acc[i] + alpha * y[i]`, rounded after the product and the sum
    ///
    /// # Safety
    ///
    /// - `acc` and `y` must have the same length
    unsafe fn axpy(alpha: f64, y: &[f64], acc: &mut [f64]);

    /// Dot product: lane-wise fused multiply-accumulate, fused remainder
    ///
    /// # Safety
    ///
    /// - `a` and `b` must have the same length
    unsafe fn dot(a: &[f64], b: &[f64]) -> f64;

    /// Sum reduction: per-lane accumulation, then a horizontal reduce
    ///
    /// # Safety
    ///
    /// - The CPU must support the backend's instruction set
    unsafe fn sum(a: &[f64]) -> f64;

    /// Clamp into `[low, high]`; a NaN bound leaves that side unclamped and NaN
    /// values stay NaN
    ///
    /// # Safety
    ///
    /// - The CPU must support the backend's instruction set
    unsafe fn clamp_assign(acc: &mut [f64], low: f64, high: f64);
}

/// Apply a scalar function lane by lane, for operators without SIMD instructions
#[inline]
pub(crate) fn lanewise(acc: &mut [f64], lanes: usize, f: fn(f64) -> f64) {
    let mut chunks = acc.chunks_exact_mut(lanes);
    for lane in &mut chunks {
        for x in lane.iter_mut() {
            *x = f(*x);
        }
    }
    for x in chunks.into_remainder() {
        *x = f(*x);
    }
}

/// Scalar clamp that keeps NaN values and ignores NaN bounds
#[inline]
pub(crate) fn clamp_scalar(x: f64, low: f64, high: f64) -> f64 {
    let mut x = x;
    if x < low {
        x = low;
    }
    if high < x {
        x = high;
    }
    x
}
