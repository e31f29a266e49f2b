//! Lane execution strategy
//!
//! Every hot loop is split into a stride-`L` vectorized part covering
//! `[0, loop_bound(n))` and a remainder covering `[loop_bound(n), n)`. The
//! remainder is processed either by one masked lane operation, using the mask
//! from [`LaneStrategy::tail_mask`], or by a scalar loop.
//!
//! # Example
//!
//! ```
//! use dlinalg::{Backend, LaneStrategy};
//!
//! let lanes = LaneStrategy::for_backend(Backend::Scalar);
//! assert_eq!(lanes.width(), 1);
//! assert_eq!(lanes.loop_bound(7), 7);
//! ```

use std::sync::OnceLock;

use crate::dispatch::Kernel;
use crate::Backend;

/// Lane width and loop-bound arithmetic for one kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneStrategy {
    width: usize,
}

impl LaneStrategy {
    /// Strategy of the kernels a backend executes
    ///
    /// Widths count `f64` lanes: AVX2/AVX-512 run 256-bit kernels (4 lanes),
    /// SSE2/AVX run 128-bit kernels (2 lanes), everything else is scalar.
    pub fn for_backend(backend: Backend) -> Self {
        LaneStrategy {
            width: Kernel::for_backend(backend).lanes(),
        }
    }

    /// Process-wide strategy for the best available backend
    ///
    /// Computed once; the native width does not change during a process.
    pub fn preferred() -> Self {
        static PREFERRED: OnceLock<LaneStrategy> = OnceLock::new();
        *PREFERRED.get_or_init(|| LaneStrategy::for_backend(Backend::select_best()))
    }

    /// Number of `f64` values per lane operation
    pub fn width(&self) -> usize {
        self.width
    }

    /// Largest multiple of the lane width that is `<= n`
    pub fn loop_bound(&self, n: usize) -> usize {
        n - n % self.width
    }

    /// Mask of the lanes starting at `loop_bound(n)` that fall inside `[loop_bound(n), n)`
    pub fn tail_mask(&self, n: usize) -> LaneMask {
        LaneMask::first(self.width, n - self.loop_bound(n))
    }
}

/// In-range flags for one partial lane operation
///
/// Lane `k` is set when index `loop_bound(n) + k` is below `n`. Set lanes are
/// always a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneMask {
    width: usize,
    bits: u8,
}

impl LaneMask {
    /// Widest supported lane operation
    pub const MAX_WIDTH: usize = 8;

    /// Mask with the first `count` of `width` lanes set
    pub(crate) fn first(width: usize, count: usize) -> Self {
        debug_assert!(width <= Self::MAX_WIDTH && count <= width);
        let bits = if count >= 8 {
            u8::MAX
        } else {
            (1u8 << count) - 1
        };
        LaneMask { width, bits }
    }

    /// Lane count of the operation this mask applies to
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw mask, lane `k` at bit `k`
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Whether lane `lane` is in range
    pub fn is_set(&self, lane: usize) -> bool {
        lane < self.width && self.bits & (1 << lane) != 0
    }

    /// Number of in-range lanes
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// True when no lane is in range (the length was an exact multiple)
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}
