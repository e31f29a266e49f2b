//! Fast-path selection
//!
//! Two decisions are made here for every operation:
//!
//! - which kernel family runs the lanes ([`Kernel`]), resolved from the
//!   operand's [`Backend`];
//! - whether the operand layouts allow the vectorized same-layout path
//!   ([`Path::Fast`]) or need the layout-agnostic element path
//!   ([`Path::Generic`]).
//!
//! The kernel wrappers below are the only place the crate calls into
//! [`crate::backends`].

use crate::backends::scalar::ScalarBackend;
#[cfg(target_arch = "x86_64")]
use crate::backends::{avx2::Avx2Backend, sse2::Sse2Backend};
use crate::backends::VectorBackend;
use crate::layout::{DenseRun, VectorLayout};
use crate::ops::{BinaryOp, UnaryOp};
use crate::Backend;

/// Kernel family a backend executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kernel {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Sse2,
    #[cfg(target_arch = "x86_64")]
    Avx2,
}

impl Kernel {
    /// Resolve a backend to the kernels that run it
    ///
    /// Backends are validated for CPU support when they are attached to a
    /// vector or matrix, so the SIMD families returned here are executable.
    pub(crate) fn for_backend(backend: Backend) -> Self {
        match backend.resolve() {
            #[cfg(target_arch = "x86_64")]
            Backend::AVX2 | Backend::AVX512 => Kernel::Avx2,
            #[cfg(target_arch = "x86_64")]
            Backend::SSE2 | Backend::AVX => Kernel::Sse2,
            _ => Kernel::Scalar,
        }
    }

    pub(crate) fn lanes(self) -> usize {
        match self {
            Kernel::Scalar => ScalarBackend::LANES,
            #[cfg(target_arch = "x86_64")]
            Kernel::Sse2 => Sse2Backend::LANES,
            #[cfg(target_arch = "x86_64")]
            Kernel::Avx2 => Avx2Backend::LANES,
        }
    }

    pub(crate) fn binary_assign(self, op: BinaryOp, acc: &mut [f64], b: &[f64]) {
        debug_assert_eq!(acc.len(), b.len());
        // SAFETY: lengths match (checked by callers) and the kernel family was
        // resolved from a backend whose CPU features were detected
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::binary_assign(op, acc, b),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::binary_assign(op, acc, b),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::binary_assign(op, acc, b),
            }
        }
    }

    pub(crate) fn binary_scalar_assign(self, op: BinaryOp, acc: &mut [f64], x: f64) {
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::binary_scalar_assign(op, acc, x),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::binary_scalar_assign(op, acc, x),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::binary_scalar_assign(op, acc, x),
            }
        }
    }

    pub(crate) fn unary_assign(self, op: UnaryOp, acc: &mut [f64]) {
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::unary_assign(op, acc),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::unary_assign(op, acc),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::unary_assign(op, acc),
            }
        }
    }

    pub(crate) fn axpy(self, alpha: f64, y: &[f64], acc: &mut [f64]) {
        debug_assert_eq!(acc.len(), y.len());
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::axpy(alpha, y, acc),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::axpy(alpha, y, acc),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::axpy(alpha, y, acc),
            }
        }
    }

    pub(crate) fn dot(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::dot(a, b),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::dot(a, b),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::dot(a, b),
            }
        }
    }

    pub(crate) fn sum(self, a: &[f64]) -> f64 {
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::sum(a),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::sum(a),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::sum(a),
            }
        }
    }

    pub(crate) fn clamp_assign(self, acc: &mut [f64], low: f64, high: f64) {
        // SAFETY: see binary_assign
        unsafe {
            match self {
                Kernel::Scalar => ScalarBackend::clamp_assign(acc, low, high),
                #[cfg(target_arch = "x86_64")]
                Kernel::Sse2 => Sse2Backend::clamp_assign(acc, low, high),
                #[cfg(target_arch = "x86_64")]
                Kernel::Avx2 => Avx2Backend::clamp_assign(acc, low, high),
            }
        }
    }
}

/// Execution path for an operation over one or two vector layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Path {
    /// Every operand is one contiguous run; lanes run directly on the buffers
    Fast(DenseRun, Option<DenseRun>),
    /// At least one operand is strided or index-mapped
    Generic,
}

/// Path for an operation reading and writing one layout
pub(crate) fn select_unary(layout: &VectorLayout) -> Path {
    match layout.dense_run() {
        Some(run) => Path::Fast(run, None),
        None => Path::Generic,
    }
}

/// Path for an operation writing `dest` and reading `src`
pub(crate) fn select_binary(dest: &VectorLayout, src: &VectorLayout) -> Path {
    match (dest.dense_run(), src.dense_run()) {
        (Some(d), Some(s)) => Path::Fast(d, Some(s)),
        _ => Path::Generic,
    }
}

#[cfg(feature = "tracing")]
pub(crate) fn trace_generic(op: &'static str, len: usize) {
    tracing::debug!(op, len, "layout-agnostic element path");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn trace_generic(_op: &'static str, _len: usize) {}
