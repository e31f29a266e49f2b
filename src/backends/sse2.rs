//! SSE2 backend implementation (x86_64 baseline SIMD)
//!
//! This backend uses SSE2 intrinsics for 128-bit SIMD operations.
//! SSE2 is available on all x86_64 CPUs as a baseline requirement.
//!
//! # Performance
//!
//! Two f64 lanes per register. There is no FMA in SSE2, so the dot product
//! accumulates with separate multiply and add instructions and only the
//! remainder uses a fused multiply-add.
//!
//! # Safety
//!
//! All SSE2 intrinsics are marked `unsafe` by Rust. This module carefully isolates
//! all unsafe code and verifies correctness through comprehensive testing.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{clamp_scalar, lanewise, VectorBackend};
use crate::ops::{BinaryOp, UnaryOp};

/// SSE2 backend (128-bit SIMD for x86_64)
pub struct Sse2Backend;

/// Lane loop over two slices with a scalar remainder
macro_rules! zip_assign {
    ($acc:expr, $b:expr, $lane:ident, $scalar:expr) => {{
        let acc: &mut [f64] = $acc;
        let b: &[f64] = $b;
        let len = acc.len();
        let mut i = 0;
        while i + 2 <= len {
            let va = _mm_loadu_pd(acc.as_ptr().add(i));
            let vb = _mm_loadu_pd(b.as_ptr().add(i));
            _mm_storeu_pd(acc.as_mut_ptr().add(i), $lane(va, vb));
            i += 2;
        }
        for j in i..len {
            acc[j] = $scalar(acc[j], b[j]);
        }
    }};
}

/// Lane loop against a broadcast scalar with a scalar remainder
macro_rules! broadcast_assign {
    ($acc:expr, $x:expr, $lane:ident, $scalar:expr) => {{
        let acc: &mut [f64] = $acc;
        let x: f64 = $x;
        let vx = _mm_set1_pd(x);
        let len = acc.len();
        let mut i = 0;
        while i + 2 <= len {
            let va = _mm_loadu_pd(acc.as_ptr().add(i));
            _mm_storeu_pd(acc.as_mut_ptr().add(i), $lane(va, vx));
            i += 2;
        }
        for j in i..len {
            acc[j] = $scalar(acc[j], x);
        }
    }};
}

impl VectorBackend for Sse2Backend {
    const LANES: usize = 2;

    #[target_feature(enable = "sse2")]
    unsafe fn binary_assign(op: BinaryOp, acc: &mut [f64], b: &[f64]) {
        match op {
            BinaryOp::Add => zip_assign!(acc, b, _mm_add_pd, |x: f64, y: f64| x + y),
            BinaryOp::Sub => zip_assign!(acc, b, _mm_sub_pd, |x: f64, y: f64| x - y),
            BinaryOp::Mul => zip_assign!(acc, b, _mm_mul_pd, |x: f64, y: f64| x * y),
            BinaryOp::Div => zip_assign!(acc, b, _mm_div_pd, |x: f64, y: f64| x / y),
        }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn binary_scalar_assign(op: BinaryOp, acc: &mut [f64], x: f64) {
        match op {
            BinaryOp::Add => broadcast_assign!(acc, x, _mm_add_pd, |a: f64, b: f64| a + b),
            BinaryOp::Sub => broadcast_assign!(acc, x, _mm_sub_pd, |a: f64, b: f64| a - b),
            BinaryOp::Mul => broadcast_assign!(acc, x, _mm_mul_pd, |a: f64, b: f64| a * b),
            BinaryOp::Div => broadcast_assign!(acc, x, _mm_div_pd, |a: f64, b: f64| a / b),
        }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn unary_assign(op: UnaryOp, acc: &mut [f64]) {
        let len = acc.len();
        let mut i = 0;
        match op {
            UnaryOp::Abs | UnaryOp::Neg => {
                // Sign bit only
                let sign = _mm_set1_pd(-0.0);
                while i + 2 <= len {
                    let va = _mm_loadu_pd(acc.as_ptr().add(i));
                    let vr = if op == UnaryOp::Abs {
                        _mm_andnot_pd(sign, va)
                    } else {
                        _mm_xor_pd(va, sign)
                    };
                    _mm_storeu_pd(acc.as_mut_ptr().add(i), vr);
                    i += 2;
                }
            }
            UnaryOp::Sqrt => {
                while i + 2 <= len {
                    let va = _mm_loadu_pd(acc.as_ptr().add(i));
                    _mm_storeu_pd(acc.as_mut_ptr().add(i), _mm_sqrt_pd(va));
                    i += 2;
                }
            }
            _ => {
                lanewise(acc, Self::LANES, op.scalar());
                return;
            }
        }

        let f = op.scalar();
        for x in &mut acc[i..] {
            *x = f(*x);
        }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn axpy(alpha: f64, y: &[f64], acc: &mut [f64]) {
        let len = acc.len();
        let mut i = 0;
        let va = _mm_set1_pd(alpha);

        while i + 2 <= len {
            let vy = _mm_loadu_pd(y.as_ptr().add(i));
            let vs = _mm_loadu_pd(acc.as_ptr().add(i));
            _mm_storeu_pd(acc.as_mut_ptr().add(i), _mm_add_pd(vs, _mm_mul_pd(va, vy)));
            i += 2;
        }

        for j in i..len {
            acc[j] += alpha * y[j];
        }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn dot(a: &[f64], b: &[f64]) -> f64 {
        let len = a.len();
        let mut i = 0;
        let mut acc = _mm_setzero_pd();

        while i + 2 <= len {
            let va = _mm_loadu_pd(a.as_ptr().add(i));
            let vb = _mm_loadu_pd(b.as_ptr().add(i));
            acc = _mm_add_pd(acc, _mm_mul_pd(va, vb));
            i += 2;
        }

        let mut result = horizontal_sum(acc);

        // Fused remainder
        for j in i..len {
            result = a[j].mul_add(b[j], result);
        }

        result
    }

    #[target_feature(enable = "sse2")]
    unsafe fn sum(a: &[f64]) -> f64 {
        let len = a.len();
        let mut i = 0;
        let mut acc = _mm_setzero_pd();

        while i + 2 <= len {
            acc = _mm_add_pd(acc, _mm_loadu_pd(a.as_ptr().add(i)));
            i += 2;
        }

        let mut result = horizontal_sum(acc);
        for &val in &a[i..] {
            result += val;
        }
        result
    }

    #[target_feature(enable = "sse2")]
    unsafe fn clamp_assign(acc: &mut [f64], low: f64, high: f64) {
        let len = acc.len();
        let mut i = 0;
        let vlow = _mm_set1_pd(low);
        let vhigh = _mm_set1_pd(high);

        while i + 2 <= len {
            let mut va = _mm_loadu_pd(acc.as_ptr().add(i));
            // Comparisons against a NaN bound are false, so that side is a no-op
            let below = _mm_cmplt_pd(va, vlow);
            va = _mm_or_pd(_mm_and_pd(below, vlow), _mm_andnot_pd(below, va));
            let above = _mm_cmplt_pd(vhigh, va);
            va = _mm_or_pd(_mm_and_pd(above, vhigh), _mm_andnot_pd(above, va));
            _mm_storeu_pd(acc.as_mut_ptr().add(i), va);
            i += 2;
        }

        for x in &mut acc[i..] {
            *x = clamp_scalar(*x, low, high);
        }
    }
}

#[target_feature(enable = "sse2")]
unsafe fn horizontal_sum(v: __m128d) -> f64 {
    let high = _mm_unpackhi_pd(v, v);
    _mm_cvtsd_f64(_mm_add_sd(v, high))
}
