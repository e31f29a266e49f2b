//! Reductions, norms and bilinear forms

use super::Vector;
use crate::dispatch::{self, Path};
use crate::error::{LinalgError, Result};
use crate::matrix::Matrix;
use crate::storage::Storage;

impl Vector {
    /// Sum of all elements; 0 for an empty vector
    ///
    /// Contiguous views accumulate per lane and reduce horizontally at the
    /// end, so the result may differ from a sequential sum by rounding.
    pub fn sum(&self) -> f64 {
        let buf = self.storage.read();
        match dispatch::select_unary(&self.layout) {
            Path::Fast(run, _) => self.kernel().sum(&buf[run.range()]),
            Path::Generic => {
                dispatch::trace_generic("sum", self.len());
                self.layout.positions().fold(0.0, |acc, p| acc + buf[p])
            }
        }
    }

    /// Sum of the non-NaN elements
    pub fn nansum(&self) -> f64 {
        self.fold(0.0, |acc, x| if x.is_nan() { acc } else { acc + x })
    }

    /// Number of non-NaN elements
    pub fn nancount(&self) -> usize {
        self.fold(0, |acc, x| if x.is_nan() { acc } else { acc + 1 })
    }

    /// Product of all elements; 1 for an empty vector
    pub fn prod(&self) -> f64 {
        self.fold(1.0, |acc, x| acc * x)
    }

    /// Product of the non-NaN elements
    pub fn nanprod(&self) -> f64 {
        self.fold(1.0, |acc, x| if x.is_nan() { acc } else { acc * x })
    }

    /// Arithmetic mean; NaN for an empty vector
    pub fn mean(&self) -> f64 {
        self.sum() / self.len() as f64
    }

    /// Mean of the non-NaN elements; NaN when there are none
    pub fn nanmean(&self) -> f64 {
        self.nansum() / self.nancount() as f64
    }

    /// Sample variance (divisor `n - 1`); NaN for fewer than two elements
    ///
    /// Two passes: the mean, then the corrected sum of squares
    /// `(Σ(x-m)² - (Σ(x-m))²/n) / (n-1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let v = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    /// assert_eq!(v.variance(), 2.5);
    /// ```
    pub fn variance(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return f64::NAN;
        }
        let mean = self.mean();
        let (sq, lin) = self.fold((0.0, 0.0), |(sq, lin), x| {
            let d = x - mean;
            (sq + d * d, lin + d)
        });
        corrected_variance(sq, lin, n)
    }

    /// Sample variance of the non-NaN elements
    pub fn nanvariance(&self) -> f64 {
        let n = self.nancount();
        if n < 2 {
            return f64::NAN;
        }
        let mean = self.nanmean();
        let (sq, lin) = self.fold((0.0, 0.0), |(sq, lin), x| {
            if x.is_nan() {
                return (sq, lin);
            }
            let d = x - mean;
            (sq + d * d, lin + d)
        });
        corrected_variance(sq, lin, n)
    }

    /// Smallest non-NaN element; NaN when every element is NaN
    ///
    /// # Errors
    ///
    /// [`LinalgError::EmptyVector`] for an empty vector.
    pub fn min(&self) -> Result<f64> {
        self.extremum(|candidate, best| candidate < best)
            .map(|(_, v)| v)
    }

    /// Largest non-NaN element; NaN when every element is NaN
    pub fn max(&self) -> Result<f64> {
        self.extremum(|candidate, best| candidate > best)
            .map(|(_, v)| v)
    }

    /// Index of the first smallest non-NaN element
    pub fn argmin(&self) -> Result<usize> {
        self.extremum(|candidate, best| candidate < best)
            .map(|(i, _)| i)
    }

    /// Index of the first largest non-NaN element
    pub fn argmax(&self) -> Result<usize> {
        self.extremum(|candidate, best| candidate > best)
            .map(|(i, _)| i)
    }

    /// Linear scan keeping the first element that `better` prefers
    fn extremum(&self, better: impl Fn(f64, f64) -> bool) -> Result<(usize, f64)> {
        if self.is_empty() {
            return Err(LinalgError::EmptyVector);
        }
        let (best, _) = self.fold(((0, f64::NAN), 0), |((bi, bv), i), x| {
            let keep = if x.is_nan() {
                (bi, bv)
            } else if bv.is_nan() || better(x, bv) {
                (i, x)
            } else {
                (bi, bv)
            };
            (keep, i + 1)
        });
        Ok(best)
    }

    /// Dot product with a conformant vector
    ///
    /// Contiguous operands accumulate with fused multiply-add lanes where the
    /// backend has them; the remainder and the generic path always use
    /// [`f64::mul_add`].
    ///
    /// # Errors
    ///
    /// [`LinalgError::DimensionMismatch`] when the sizes differ.
    pub fn dot(&self, other: &Vector) -> Result<f64> {
        self.conform("dot", other.len())?;
        let kernel = self.kernel();
        Ok(Storage::with_read_pair(&self.storage, &other.storage, |a, b| {
            match dispatch::select_binary(&self.layout, &other.layout) {
                Path::Fast(ra, Some(rb)) => kernel.dot(&a[ra.range()], &b[rb.range()]),
                _ => {
                    dispatch::trace_generic("dot", self.len());
                    (0..self.len()).fold(0.0, |acc, i| {
                        a[self.layout.position(i)].mul_add(b[other.layout.position(i)], acc)
                    })
                }
            }
        }))
    }

    /// `p`-norm
    ///
    /// `p <= 0` returns the number of elements, `p = +inf` returns [`max`](Self::max),
    /// otherwise `(Σ|x|^p)^(1/p)`.
    ///
    /// # Errors
    ///
    /// `p = +inf` on an empty vector is [`LinalgError::EmptyVector`], the
    /// same as `max`, rather than NaN. Every other `p` succeeds on an empty
    /// vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let v = Vector::from_slice(&[3.0, -4.0]);
    /// assert_eq!(v.norm(2.0).unwrap(), 5.0);
    /// assert_eq!(v.norm(1.0).unwrap(), 7.0);
    /// assert_eq!(v.norm(0.0).unwrap(), 2.0);
    /// ```
    pub fn norm(&self, p: f64) -> Result<f64> {
        if p <= 0.0 {
            return Ok(self.len() as f64);
        }
        if p == f64::INFINITY {
            return self.max();
        }
        if p == 1.0 {
            return Ok(self.fold(0.0, |acc, x| acc + x.abs()));
        }
        if p == 2.0 {
            return Ok(self.dot(self)?.sqrt());
        }
        let total = self.fold(0.0, |acc, x| acc + x.abs().powf(p));
        Ok(total.powf(1.0 / p))
    }

    /// Divide by `norm(p)` in place; unchanged when the norm is zero
    pub fn normalize(&mut self, p: f64) -> Result<&mut Self> {
        let norm = self.norm(p)?;
        if norm != 0.0 {
            self.div_scalar(norm);
        }
        Ok(self)
    }

    /// Replace each element with the running sum
    pub fn cumsum(&mut self) -> &mut Self {
        let mut acc = 0.0;
        self.update_indexed(|_, x| {
            acc += x;
            acc
        });
        self
    }

    /// Replace each element with the running product
    pub fn cumprod(&mut self) -> &mut Self {
        let mut acc = 1.0;
        self.update_indexed(|_, x| {
            acc *= x;
            acc
        });
        self
    }

    /// Same size and every pair of elements within `eps`
    ///
    /// NaNs at the same index compare equal.
    pub fn deep_equals(&self, other: &Vector, eps: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.to_vec()
            .iter()
            .zip(other.to_vec())
            .all(|(&a, b)| (a.is_nan() && b.is_nan()) || (a - b).abs() <= eps)
    }

    /// `selfᵗ · m · y`
    ///
    /// # Errors
    ///
    /// [`LinalgError::DimensionMismatch`] unless `m` is `len(self) × len(y)`.
    pub fn dot_bilinear(&self, m: &Matrix, y: &Vector) -> Result<f64> {
        self.conform("dot_bilinear", m.rows())?;
        if m.cols() != y.len() {
            return Err(LinalgError::mismatch("dot_bilinear", m.cols(), y.len()));
        }
        let x = self.to_vec();
        let y = y.to_vec();
        Ok(m.fold_elements(0.0, |acc, i, j, v| acc + x[i] * v * y[j]))
    }

    /// `selfᵗ · m · self`
    pub fn dot_bilinear_self(&self, m: &Matrix) -> Result<f64> {
        self.conform("dot_bilinear", m.rows())?;
        self.conform("dot_bilinear", m.cols())?;
        let x = self.to_vec();
        Ok(m.fold_elements(0.0, |acc, i, j, v| acc + x[i] * v * x[j]))
    }

    /// `selfᵗ · diag(m) · y`, ignoring the off-diagonal entries of `m`
    pub fn dot_bilinear_diag(&self, m: &Matrix, y: &Vector) -> Result<f64> {
        self.conform("dot_bilinear_diag", m.rows())?;
        self.conform("dot_bilinear_diag", m.cols())?;
        self.conform("dot_bilinear_diag", y.len())?;
        let d = m.diag();
        self.dot_bilinear_diag_vec(&d, y)
    }

    /// `selfᵗ · diag(m) · self`
    pub fn dot_bilinear_diag_self(&self, m: &Matrix) -> Result<f64> {
        self.dot_bilinear_diag(m, self)
    }

    /// `Σ self_i · d_i · y_i`
    pub fn dot_bilinear_diag_vec(&self, d: &Vector, y: &Vector) -> Result<f64> {
        self.conform("dot_bilinear_diag", d.len())?;
        self.conform("dot_bilinear_diag", y.len())?;
        let x = self.to_vec();
        let d = d.to_vec();
        let y = y.to_vec();
        Ok((0..x.len()).fold(0.0, |acc, i| acc + x[i] * d[i] * y[i]))
    }

    /// `Σ self_i · d_i · self_i`
    pub fn dot_bilinear_diag_vec_self(&self, d: &Vector) -> Result<f64> {
        self.dot_bilinear_diag_vec(d, self)
    }

    /// Outer product `self · bᵗ` as a new `len(self) × len(b)` matrix
    pub fn outer(&self, b: &Vector) -> Matrix {
        let x = self.to_vec();
        let y = b.to_vec();
        Matrix::from_fn(x.len(), y.len(), |i, j| x[i] * y[j]).with_backend_unchecked(self.backend)
    }
}

fn corrected_variance(sq: f64, lin: f64, n: usize) -> f64 {
    let n = n as f64;
    (sq - lin * lin / n) / (n - 1.0)
}


#[cfg(test)]
mod property_tests {
    use crate::vector::Vector;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_sum_matches_sequential(
            values in prop::collection::vec(-1000.0f64..1000.0, 0..64)
        ) {
            let naive: f64 = values.iter().fold(0.0, |a, &x| a + x);
            let v = Vector::from_slice(&values);
            prop_assert!((v.sum() - naive).abs() <= 1e-9 * (1.0 + naive.abs()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_dot_is_symmetric(
            a in prop::collection::vec(-100.0f64..100.0, 1..64),
            b in prop::collection::vec(-100.0f64..100.0, 1..64)
        ) {
            let len = a.len().min(b.len());
            let va = Vector::from_slice(&a[..len]);
            let vb = Vector::from_slice(&b[..len]);
            prop_assert_eq!(va.dot(&vb).unwrap(), vb.dot(&va).unwrap());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_variance_is_shift_invariant(
            values in prop::collection::vec(-100.0f64..100.0, 2..40),
            shift in -50.0f64..50.0
        ) {
            let v = Vector::from_slice(&values);
            let mut shifted = v.copy();
            shifted.add_scalar(shift);
            let (a, b) = (v.variance(), shifted.variance());
            prop_assert!((a - b).abs() <= 1e-6 * (1.0 + a.abs()));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_argmax_points_at_max(
            values in prop::collection::vec(-1000.0f64..1000.0, 1..50)
        ) {
            let v = Vector::from_slice(&values);
            let i = v.argmax().unwrap();
            prop_assert_eq!(v.get(i), v.max().unwrap());
            prop_assert!(values.iter().all(|&x| x <= values[i]));
        }
    }
}
