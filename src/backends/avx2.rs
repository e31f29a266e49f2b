//! AVX2 backend implementation (x86_64 advanced SIMD)
//!
//! This backend uses AVX2 intrinsics for 256-bit SIMD operations with FMA.
//! AVX2 is available on Intel Haswell (2013+) and AMD Excavator (2015+) CPUs.
//!
//! # Performance
//!
//! Four f64 lanes per register. The dot product accumulates with FMA, and the
//! sum handles the partial lane with a single masked load instead of a scalar
//! loop.
//!
//! # Safety
//!
//! All AVX2 intrinsics are marked `unsafe` by Rust. This module carefully isolates
//! all unsafe code and verifies correctness through comprehensive testing.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{clamp_scalar, lanewise, VectorBackend};
use crate::lanes::LaneMask;
use crate::ops::{BinaryOp, UnaryOp};

/// AVX2 backend (256-bit SIMD for x86_64)
pub struct Avx2Backend;

/// Lane loop over two slices with a scalar remainder
macro_rules! zip_assign {
    ($acc:expr, $b:expr, $lane:ident, $scalar:expr) => {{
        let acc: &mut [f64] = $acc;
        let b: &[f64] = $b;
        let len = acc.len();
        let mut i = 0;
        while i + 4 <= len {
            let va = _mm256_loadu_pd(acc.as_ptr().add(i));
            let vb = _mm256_loadu_pd(b.as_ptr().add(i));
            _mm256_storeu_pd(acc.as_mut_ptr().add(i), $lane(va, vb));
            i += 4;
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
        let vx = _mm256_set1_pd(x);
        let len = acc.len();
        let mut i = 0;
        while i + 4 <= len {
            let va = _mm256_loadu_pd(acc.as_ptr().add(i));
            _mm256_storeu_pd(acc.as_mut_ptr().add(i), $lane(va, vx));
            i += 4;
        }
        for j in i..len {
            acc[j] = $scalar(acc[j], x);
        }
    }};
}

impl VectorBackend for Avx2Backend {
    const LANES: usize = 4;

    #[target_feature(enable = "avx2")]
    unsafe fn binary_assign(op: BinaryOp, acc: &mut [f64], b: &[f64]) {
        match op {
            BinaryOp::Add => zip_assign!(acc, b, _mm256_add_pd, |x: f64, y: f64| x + y),
            BinaryOp::Sub => zip_assign!(acc, b, _mm256_sub_pd, |x: f64, y: f64| x - y),
            BinaryOp::Mul => zip_assign!(acc, b, _mm256_mul_pd, |x: f64, y: f64| x * y),
            BinaryOp::Div => zip_assign!(acc, b, _mm256_div_pd, |x: f64, y: f64| x / y),
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn binary_scalar_assign(op: BinaryOp, acc: &mut [f64], x: f64) {
        match op {
            BinaryOp::Add => broadcast_assign!(acc, x, _mm256_add_pd, |a: f64, b: f64| a + b),
            BinaryOp::Sub => broadcast_assign!(acc, x, _mm256_sub_pd, |a: f64, b: f64| a - b),
            BinaryOp::Mul => broadcast_assign!(acc, x, _mm256_mul_pd, |a: f64, b: f64| a * b),
            BinaryOp::Div => broadcast_assign!(acc, x, _mm256_div_pd, |a: f64, b: f64| a / b),
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn unary_assign(op: UnaryOp, acc: &mut [f64]) {
        let len = acc.len();
        let mut i = 0;
        match op {
            UnaryOp::Abs | UnaryOp::Neg => {
                let sign = _mm256_set1_pd(-0.0);
                while i + 4 <= len {
                    let va = _mm256_loadu_pd(acc.as_ptr().add(i));
                    let vr = if op == UnaryOp::Abs {
                        _mm256_andnot_pd(sign, va)
                    } else {
                        _mm256_xor_pd(va, sign)
                    };
                    _mm256_storeu_pd(acc.as_mut_ptr().add(i), vr);
                    i += 4;
                }
            }
            UnaryOp::Sqrt => {
                while i + 4 <= len {
                    let va = _mm256_loadu_pd(acc.as_ptr().add(i));
                    _mm256_storeu_pd(acc.as_mut_ptr().add(i), _mm256_sqrt_pd(va));
                    i += 4;
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

    #[target_feature(enable = "avx2")]
    unsafe fn axpy(alpha: f64, y: &[f64], acc: &mut [f64]) {
        let len = acc.len();
        let mut i = 0;
        let va = _mm256_set1_pd(alpha);

        // Separate multiply and add so every backend rounds identically
        while i + 4 <= len {
            let vy = _mm256_loadu_pd(y.as_ptr().add(i));
            let vs = _mm256_loadu_pd(acc.as_ptr().add(i));
            _mm256_storeu_pd(
                acc.as_mut_ptr().add(i),
                _mm256_add_pd(vs, _mm256_mul_pd(va, vy)),
            );
            i += 4;
        }

        for j in i..len {
            acc[j] += alpha * y[j];
        }
    }

    #[target_feature(enable = "avx2", enable = "fma")]
    unsafe fn dot(a: &[f64], b: &[f64]) -> f64 {
        let len = a.len();
        let mut i = 0;

        // Accumulator for 4-way parallel accumulation
        let mut acc = _mm256_setzero_pd();

        while i + 4 <= len {
            let va = _mm256_loadu_pd(a.as_ptr().add(i));
            let vb = _mm256_loadu_pd(b.as_ptr().add(i));

            // Fused multiply-add: acc = acc + (va * vb)
            acc = _mm256_fmadd_pd(va, vb, acc);

            i += 4;
        }

        let mut result = horizontal_sum(acc);

        // Fused remainder, one rounding per element
        for j in i..len {
            result = a[j].mul_add(b[j], result);
        }

        result
    }

    #[target_feature(enable = "avx2")]
    unsafe fn sum(a: &[f64]) -> f64 {
        let len = a.len();
        let bound = len - len % Self::LANES;
        let mut i = 0;

        let mut acc = _mm256_setzero_pd();

        while i < bound {
            acc = _mm256_add_pd(acc, _mm256_loadu_pd(a.as_ptr().add(i)));
            i += 4;
        }

        // Partial lane: masked-off lanes are never read
        let mask = LaneMask::first(Self::LANES, len - bound);
        if !mask.is_empty() {
            let tail = _mm256_maskload_pd(a.as_ptr().add(bound), mask_vector(mask));
            acc = _mm256_add_pd(acc, tail);
        }

        horizontal_sum(acc)
    }

    #[target_feature(enable = "avx2")]
    unsafe fn clamp_assign(acc: &mut [f64], low: f64, high: f64) {
        let len = acc.len();
        let mut i = 0;
        let vlow = _mm256_set1_pd(low);
        let vhigh = _mm256_set1_pd(high);

        while i + 4 <= len {
            let mut va = _mm256_loadu_pd(acc.as_ptr().add(i));
            // Ordered compares are false against NaN, leaving that side alone
            let below = _mm256_cmp_pd::<_CMP_LT_OQ>(va, vlow);
            va = _mm256_blendv_pd(va, vlow, below);
            let above = _mm256_cmp_pd::<_CMP_LT_OQ>(vhigh, va);
            va = _mm256_blendv_pd(va, vhigh, above);
            _mm256_storeu_pd(acc.as_mut_ptr().add(i), va);
            i += 4;
        }

        for x in &mut acc[i..] {
            *x = clamp_scalar(*x, low, high);
        }
    }
}

/// Horizontal sum: reduce 4 lanes to a single value
#[target_feature(enable = "avx2")]
unsafe fn horizontal_sum(v: __m256d) -> f64 {
    let low = _mm256_castpd256_pd128(v);
    let high = _mm256_extractf128_pd::<1>(v);
    let sum2 = _mm_add_pd(low, high);
    let upper = _mm_unpackhi_pd(sum2, sum2);
    _mm_cvtsd_f64(_mm_add_sd(sum2, upper))
}

/// Expand a lane mask into the sign-bit form `maskload` expects
#[target_feature(enable = "avx2")]
unsafe fn mask_vector(mask: LaneMask) -> __m256i {
    let lane = |k: usize| if mask.is_set(k) { -1i64 } else { 0 };
    _mm256_set_epi64x(lane(3), lane(2), lane(1), lane(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_avx2() -> bool {
        if !(is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")) {
            eprintln!("Skipping AVX2 test: CPU does not support AVX2+FMA");
            return false;
        }
        true
    }

    #[test]
    fn test_avx2_add() {
        if !has_avx2() {
            return;
        }

        let mut acc = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let b = vec![9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        unsafe { Avx2Backend::binary_assign(BinaryOp::Add, &mut acc, &b) };
        assert_eq!(acc, vec![10.0; 9]);
    }

    #[test]
    fn test_avx2_mul_scalar() {
        if !has_avx2() {
            return;
        }

        let mut acc = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        unsafe { Avx2Backend::binary_scalar_assign(BinaryOp::Mul, &mut acc, 3.0) };
        assert_eq!(acc, vec![3.0, 6.0, 9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_avx2_sqrt_and_sin() {
        if !has_avx2() {
            return;
        }

        let mut acc = vec![1.0, 4.0, 9.0, 16.0, 25.0, 36.0];
        unsafe { Avx2Backend::unary_assign(UnaryOp::Sqrt, &mut acc) };
        assert_eq!(acc, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut acc = vec![0.0; 5];
        unsafe { Avx2Backend::unary_assign(UnaryOp::Sin, &mut acc) };
        assert_eq!(acc, vec![0.0; 5]);
    }

    #[test]
    fn test_avx2_masked_sum_every_tail() {
        if !has_avx2() {
            return;
        }

        for len in 0..13 {
            let a: Vec<f64> = (0..len).map(|i| i as f64 + 0.5).collect();
            let expected: f64 = a.iter().sum();
            let actual = unsafe { Avx2Backend::sum(&a) };
            assert!(
                (actual - expected).abs() < 1e-12,
                "len {len}: {actual} != {expected}"
            );
        }
    }

    #[test]
    fn test_avx2_dot_matches_scalar_fma() {
        if !has_avx2() {
            return;
        }

        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let b = [7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        assert_eq!(unsafe { Avx2Backend::dot(&a, &b) }, 84.0);
    }

    #[test]
    fn test_avx2_clamp() {
        if !has_avx2() {
            return;
        }

        let mut acc = vec![-5.0, 5.0, 15.0, 0.5, -1.0, 11.0];
        unsafe { Avx2Backend::clamp_assign(&mut acc, 0.0, 10.0) };
        assert_eq!(acc, vec![0.0, 5.0, 10.0, 0.5, 0.0, 10.0]);
    }

    #[test]
    fn test_avx2_axpy() {
        if !has_avx2() {
            return;
        }

        let mut acc = vec![1.0; 6];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        unsafe { Avx2Backend::axpy(0.5, &y, &mut acc) };
        assert_eq!(acc, vec![1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
    }
}
