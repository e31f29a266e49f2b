//! dlinalg: Dense Linear Algebra over Shared f64 Buffers
//!
//! **dlinalg** provides vector and matrix abstractions backed by flat `f64`
//! buffers, with three things in common across every operation:
//!
//! 1. **Views, not copies** - dense, strided and index-mapped views share one
//!    backing [`Storage`]; mutating through any view is visible through all
//!    views over the same region.
//! 2. **Runtime SIMD dispatch** - a lane-width strategy picks the widest kernel
//!    the CPU supports (SSE2/AVX2 on x86_64, scalar elsewhere) and handles the
//!    partial lane at the buffer boundary.
//! 3. **Block-parallel multiplication** - matrix×vector and matrix×matrix split
//!    their output into disjoint chunks computed on a rayon pool.
//!
//! # Design Principles
//!
//! - **Fast path when layouts allow**: contiguous operands run vectorized
//!   kernels, anything else falls back to a layout-agnostic element path
//! - **Fail before mutating**: shape problems are reported before any write
//! - **`unsafe` isolated in backends**: the public API is safe
//!
//! # Quick Start
//!
//! ```rust
//! use dlinalg::{Matrix, Vector};
//!
//! let a = Matrix::wrap(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let v = Vector::from_slice(&[1.0, 0.0, 1.0]);
//!
//! let r = a.matvec(&v).unwrap();
//! assert_eq!(r.to_vec(), vec![4.0, 10.0]);
//! ```

use std::sync::OnceLock;

pub mod backends;
pub mod config;
pub(crate) mod dispatch;
pub mod error;
pub mod lanes;
pub mod layout;
pub mod matrix;
pub mod ops;
pub mod parallel;
pub mod source;
pub mod storage;
pub mod vector;

pub use config::ComputeConfig;
pub use error::{LinalgError, Result};
pub use lanes::{LaneMask, LaneStrategy};
pub use layout::{DenseRun, MatrixLayout, Orientation, VectorLayout};
pub use matrix::{Axis, CopyRange, Matrix};
pub use ops::{BinaryOp, UnaryOp};
pub use source::{Sampler, TabularSource, ValueGenerator};
pub use storage::Storage;
pub use vector::Vector;

/// Backend execution target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Scalar fallback (no SIMD)
    Scalar,
    /// SSE2 (x86_64 baseline, 128-bit)
    SSE2,
    /// AVX (256-bit, executes the SSE2 kernels)
    AVX,
    /// AVX2 (256-bit with FMA)
    AVX2,
    /// AVX-512 (executes the AVX2 kernels)
    AVX512,
    /// ARM NEON
    NEON,
    /// WebAssembly SIMD128
    WasmSIMD,
    /// Auto-select best available
    Auto,
}

impl Backend {
    /// Select the best available backend for the current platform
    ///
    /// Runs `select_best_available_backend()` once per process and caches the
    /// answer; every constructor asks for it.
    pub fn select_best() -> Self {
        static BEST: OnceLock<Backend> = OnceLock::new();
        *BEST.get_or_init(select_best_available_backend)
    }

    /// Resolve `Auto` to the best available backend, leaving others untouched
    pub fn resolve(self) -> Self {
        match self {
            Backend::Auto => Backend::select_best(),
            other => other,
        }
    }

    /// Whether the CPU running this process can execute this backend's kernels
    ///
    /// `Auto` and `Scalar` are always available. ARM and WASM backends run the
    /// scalar kernels, so they are available on their own architectures.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Scalar | Backend::Auto => true,
            #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
            Backend::SSE2 => is_x86_feature_detected!("sse2"),
            #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
            Backend::AVX => is_x86_feature_detected!("avx"),
            #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
            Backend::AVX2 => is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"),
            #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
            Backend::AVX512 => {
                is_x86_feature_detected!("avx512f")
                    && is_x86_feature_detected!("avx2")
                    && is_x86_feature_detected!("fma")
            }
            #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
            Backend::SSE2 | Backend::AVX | Backend::AVX2 | Backend::AVX512 => false,
            Backend::NEON => cfg!(any(target_arch = "aarch64", target_arch = "arm")),
            Backend::WasmSIMD => cfg!(target_arch = "wasm32"),
        }
    }
}

/// Detect best SIMD backend for x86/x86_64 platforms
#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
fn detect_x86_backend() -> Backend {
    let fma = is_x86_feature_detected!("fma");
    if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx2") && fma {
        return Backend::AVX512;
    }
    if is_x86_feature_detected!("avx2") && fma {
        return Backend::AVX2;
    }
    if is_x86_feature_detected!("avx") {
        return Backend::AVX;
    }
    if is_x86_feature_detected!("sse2") {
        return Backend::SSE2;
    }
    Backend::Scalar
}

/// Detect best SIMD backend for ARM platforms
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
fn detect_arm_backend() -> Backend {
    #[cfg(target_feature = "neon")]
    {
        Backend::NEON
    }
    #[cfg(not(target_feature = "neon"))]
    {
        Backend::Scalar
    }
}

/// Detect best SIMD backend for WebAssembly
#[cfg(target_arch = "wasm32")]
fn detect_wasm_backend() -> Backend {
    #[cfg(target_feature = "simd128")]
    {
        Backend::WasmSIMD
    }
    #[cfg(not(target_feature = "simd128"))]
    {
        Backend::Scalar
    }
}

/// Select the best available backend for the current platform
///
/// Runtime CPU feature detection, in priority order:
///
/// **x86/x86_64**:
/// 1. AVX-512 (if `avx512f`, `avx2` and `fma` are detected)
/// 2. AVX2 (if `avx2` and `fma` are detected)
/// 3. AVX (if `avx` is detected)
/// 4. SSE2 (baseline for x86_64)
/// 5. Scalar (fallback)
///
/// **ARM**: NEON if available, else Scalar
///
/// **WASM**: SIMD128 if available, else Scalar
///
/// **Other platforms**: Scalar
///
/// # Examples
///
/// ```
/// use dlinalg::select_best_available_backend;
///
/// let backend = select_best_available_backend();
/// assert!(backend.is_available());
/// ```
pub fn select_best_available_backend() -> Backend {
    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        detect_x86_backend()
    }

    #[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
    {
        detect_arm_backend()
    }

    #[cfg(target_arch = "wasm32")]
    {
        detect_wasm_backend()
    }

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "arm",
        target_arch = "wasm32"
    )))]
    {
        Backend::Scalar
    }
}
