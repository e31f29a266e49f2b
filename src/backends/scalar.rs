//! Scalar (non-SIMD) backend implementation
//!
//! This is the portable baseline implementation that works on all platforms.
//! It uses simple loops without any SIMD instructions and is the correctness
//! reference the SIMD backends are tested against.

use super::{clamp_scalar, VectorBackend};
use crate::ops::{BinaryOp, UnaryOp};

/// Scalar backend (portable, no SIMD)
pub struct ScalarBackend;

impl VectorBackend for ScalarBackend {
    const LANES: usize = 1;

    // SAFETY: This function is safe because:
    // 1. All slice accesses go through bounds-checked iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match VectorBackend trait interface
    unsafe fn binary_assign(op: BinaryOp, acc: &mut [f64], b: &[f64]) {
        let f = op.scalar();
        for (x, &y) in acc.iter_mut().zip(b) {
            *x = f(*x, y);
        }
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn binary_scalar_assign(op: BinaryOp, acc: &mut [f64], x: f64) {
        let f = op.scalar();
        for a in acc.iter_mut() {
            *a = f(*a, x);
        }
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn unary_assign(op: UnaryOp, acc: &mut [f64]) {
        let f = op.scalar();
        for x in acc.iter_mut() {
            *x = f(*x);
        }
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn axpy(alpha: f64, y: &[f64], acc: &mut [f64]) {
        for (a, &v) in acc.iter_mut().zip(y) {
            *a += alpha * v;
        }
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn dot(a: &[f64], b: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (&x, &y) in a.iter().zip(b) {
            sum = x.mul_add(y, sum);
        }
        sum
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn sum(a: &[f64]) -> f64 {
        let mut total = 0.0;
        for &val in a {
            total += val;
        }
        total
    }

    // SAFETY: bounds-checked iteration only; unsafe to match the trait
    unsafe fn clamp_assign(acc: &mut [f64], low: f64, high: f64) {
        for x in acc.iter_mut() {
            *x = clamp_scalar(*x, low, high);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_binary() {
        let mut acc = vec![1.0, 2.0, 3.0];
        unsafe { ScalarBackend::binary_assign(BinaryOp::Sub, &mut acc, &[0.5, 0.5, 0.5]) };
        assert_eq!(acc, vec![0.5, 1.5, 2.5]);

        unsafe { ScalarBackend::binary_scalar_assign(BinaryOp::Mul, &mut acc, 2.0) };
        assert_eq!(acc, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_scalar_unary() {
        let mut acc = vec![-1.0, 4.0];
        unsafe { ScalarBackend::unary_assign(UnaryOp::Abs, &mut acc) };
        assert_eq!(acc, vec![1.0, 4.0]);
    }

    #[test]
    fn test_scalar_axpy() {
        let mut acc = vec![1.0, 1.0, 1.0];
        unsafe { ScalarBackend::axpy(2.0, &[1.0, 2.0, 3.0], &mut acc) };
        assert_eq!(acc, vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_scalar_dot_and_sum() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert_eq!(unsafe { ScalarBackend::dot(&a, &b) }, 32.0);
        assert_eq!(unsafe { ScalarBackend::sum(&a) }, 6.0);
        assert_eq!(unsafe { ScalarBackend::sum(&[]) }, 0.0);
    }

    #[test]
    fn test_scalar_clamp() {
        let mut acc = vec![-5.0, 5.0, 15.0];
        unsafe { ScalarBackend::clamp_assign(&mut acc, 0.0, 10.0) };
        assert_eq!(acc, vec![0.0, 5.0, 10.0]);
    }
}
