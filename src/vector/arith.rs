//! Elementwise arithmetic
//!
//! In-place forms return `&mut Self` for chaining; destination forms (`*_to`)
//! leave `self` untouched and overwrite `to`. Size checks happen before the
//! first write in every form.

use super::{Vector, Zip};
use crate::backends::clamp_scalar;
use crate::error::Result;
use crate::ops::{BinaryOp, UnaryOp};

/// In-place and destination methods for each unary operator
macro_rules! unary_methods {
    ($($name:ident, $name_to:ident => $op:ident;)*) => {
        impl Vector {
            $(
                #[doc = concat!("Apply `", stringify!($name), "` to every element in place")]
                pub fn $name(&mut self) -> &mut Self {
                    self.apply_op(UnaryOp::$op)
                }

                #[doc = concat!("Write `", stringify!($name), "` of every element into `to`")]
                pub fn $name_to(&self, to: &mut Vector) -> Result<()> {
                    self.apply_op_to(UnaryOp::$op, to)
                }
            )*
        }
    };
}

unary_methods! {
    log, log_to => Log;
    log1p, log1p_to => Log1p;
    log10, log10_to => Log10;
    abs, abs_to => Abs;
    neg, neg_to => Neg;
    sin, sin_to => Sin;
    cos, cos_to => Cos;
    tan, tan_to => Tan;
    asin, asin_to => Asin;
    acos, acos_to => Acos;
    atan, atan_to => Atan;
    sinh, sinh_to => Sinh;
    cosh, cosh_to => Cosh;
    tanh, tanh_to => Tanh;
    exp, exp_to => Exp;
    expm1, expm1_to => Expm1;
    sqrt, sqrt_to => Sqrt;
    cbrt, cbrt_to => Cbrt;
}

/// In-place and destination methods for each binary operator
macro_rules! binary_methods {
    ($($name:ident, $name_to:ident, $scalar:ident, $scalar_to:ident => $op:ident;)*) => {
        impl Vector {
            $(
                #[doc = concat!("Elementwise `", stringify!($name), "` of a conformant vector, in place")]
                ///
                /// # Errors
                ///
                /// [`LinalgError::DimensionMismatch`](crate::LinalgError::DimensionMismatch)
                /// when the sizes differ; neither operand is touched.
                pub fn $name(&mut self, other: &Vector) -> Result<&mut Self> {
                    self.zip_assign(other, Zip::Binary(BinaryOp::$op))?;
                    Ok(self)
                }

                #[doc = concat!("Write `self ", stringify!($name), " other` into `to`")]
                pub fn $name_to(&self, other: &Vector, to: &mut Vector) -> Result<()> {
                    self.zip_to(other, to, Zip::Binary(BinaryOp::$op))
                }

                #[doc = concat!("`", stringify!($name), "` a scalar to every element, in place")]
                pub fn $scalar(&mut self, x: f64) -> &mut Self {
                    self.binary_scalar(BinaryOp::$op, x)
                }

                #[doc = concat!("Write `self ", stringify!($name), " x` into `to`")]
                pub fn $scalar_to(&self, x: f64, to: &mut Vector) -> Result<()> {
                    self.conform(BinaryOp::$op.name(), to.len())?;
                    to.copy_from(self)?;
                    to.binary_scalar(BinaryOp::$op, x);
                    Ok(())
                }
            )*
        }
    };
}

binary_methods! {
    add, add_to, add_scalar, add_scalar_to => Add;
    sub, sub_to, sub_scalar, sub_scalar_to => Sub;
    mul, mul_to, mul_scalar, mul_scalar_to => Mul;
    div, div_to, div_scalar, div_scalar_to => Div;
}

impl Vector {
    /// Apply `op` to every element in place
    pub fn apply_op(&mut self, op: UnaryOp) -> &mut Self {
        self.update_with(op.name(), |k, run| k.unary_assign(op, run), op.scalar());
        self
    }

    /// Write `op` of every element into `to`
    pub fn apply_op_to(&self, op: UnaryOp, to: &mut Vector) -> Result<()> {
        self.conform(op.name(), to.len())?;
        to.copy_from(self)?;
        to.apply_op(op);
        Ok(())
    }

    pub(crate) fn binary_scalar(&mut self, op: BinaryOp, x: f64) -> &mut Self {
        self.update_with(
            op.name(),
            |k, run| k.binary_scalar_assign(op, run, x),
            |v| op.apply(v, x),
        );
        self
    }

    /// `self += a * y`
    ///
    /// # Examples
    ///
    /// ```
    /// use dlinalg::Vector;
    ///
    /// let mut acc = Vector::from_slice(&[1.0, 1.0]);
    /// acc.fma(2.0, &Vector::from_slice(&[3.0, 4.0])).unwrap();
    /// assert_eq!(acc.to_vec(), vec![7.0, 9.0]);
    /// ```
    pub fn fma(&mut self, a: f64, y: &Vector) -> Result<&mut Self> {
        self.zip_assign(y, Zip::Axpy(a))?;
        Ok(self)
    }

    /// New vector holding `self + a * y`
    pub fn fma_new(&self, a: f64, y: &Vector) -> Result<Vector> {
        self.conform("fma", y.len())?;
        let mut out = self.copy();
        out.fma(a, y)?;
        Ok(out)
    }

    /// Clamp every element into `[low, high]`
    ///
    /// A NaN bound disables clamping on that side; NaN elements stay NaN.
    pub fn cut(&mut self, low: f64, high: f64) -> &mut Self {
        self.update_with(
            "cut",
            |k, run| k.clamp_assign(run, low, high),
            |v| clamp_scalar(v, low, high),
        );
        self
    }

    /// Write the clamped elements into `to`
    pub fn cut_to(&self, low: f64, high: f64, to: &mut Vector) -> Result<()> {
        self.conform("cut", to.len())?;
        to.copy_from(self)?;
        to.cut(low, high);
        Ok(())
    }

    /// Replace every element `x` with `f(x)`
    pub fn apply(&mut self, f: impl Fn(f64) -> f64) -> &mut Self {
        self.update_indexed(|_, x| f(x));
        self
    }

    /// Replace element `i` with `f(i, x)`
    pub fn apply_indexed(&mut self, f: impl Fn(usize, f64) -> f64) -> &mut Self {
        self.update_indexed(f);
        self
    }

    /// Write `f(x)` of every element into `to`
    pub fn apply_to(&self, f: impl Fn(f64) -> f64, to: &mut Vector) -> Result<()> {
        self.conform("apply", to.len())?;
        to.copy_from(self)?;
        to.apply(f);
        Ok(())
    }

    /// Set every element to `value`
    pub fn fill_value(&mut self, value: f64) -> &mut Self {
        self.store(&vec![value; self.len()]);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::error::LinalgError;
    use crate::storage::Storage;
    use crate::vector::Vector;
    use crate::Backend;

    fn strided(values: &[f64]) -> Vector {
        // Interleave with padding so the view is stride 2
        let mut buf = Vec::with_capacity(values.len() * 2);
        for &v in values {
            buf.push(v);
            buf.push(-99.0);
        }
        Vector::wrap_strided(Storage::from_vec(buf), 0, 2, values.len()).unwrap()
    }

    #[test]
    fn test_unary_dense_and_strided_agree() {
        let values = [0.5, 1.0, 2.0, 4.0, 9.0];
        let mut dense = Vector::from_slice(&values);
        let mut view = strided(&values);
        dense.sqrt().log();
        view.sqrt().log();
        for (a, b) in dense.to_vec().iter().zip(view.to_vec()) {
            assert_eq!(*a, b);
        }
        // padding untouched
        assert_eq!(view.storage().to_vec()[1], -99.0);
    }

    #[test]
    fn test_unary_to() {
        let v = Vector::from_slice(&[-1.0, 2.0, -3.0]);
        let mut to = Vector::zeros(3);
        v.abs_to(&mut to).unwrap();
        assert_eq!(to.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(v.to_vec(), vec![-1.0, 2.0, -3.0]);
        assert!(v.neg_to(&mut Vector::zeros(2)).is_err());
    }

    #[test]
    fn test_binary_mismatch_leaves_operands() {
        let mut a = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let b = Vector::from_slice(&[1.0, 2.0]);
        let err = a.add(&b).unwrap_err();
        assert_eq!(
            err,
            LinalgError::DimensionMismatch {
                context: "add",
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(b.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_binary_in_place_and_to() {
        let mut a = Vector::from_slice(&[6.0, 8.0, 10.0]);
        let b = Vector::from_slice(&[2.0, 4.0, 5.0]);
        a.div(&b).unwrap().mul_scalar(3.0);
        assert_eq!(a.to_vec(), vec![9.0, 6.0, 6.0]);

        let mut to = Vector::zeros(3);
        a.sub_to(&b, &mut to).unwrap();
        assert_eq!(to.to_vec(), vec![7.0, 2.0, 1.0]);
        a.add_scalar_to(1.0, &mut to).unwrap();
        assert_eq!(to.to_vec(), vec![10.0, 7.0, 7.0]);
    }

    #[test]
    fn test_binary_mixed_layouts() {
        let mut dense = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let view = strided(&[10.0, 20.0, 30.0]);
        dense.add(&view).unwrap();
        assert_eq!(dense.to_vec(), vec![11.0, 22.0, 33.0]);

        let mapped = dense.map(&[2, 0, 1]).unwrap();
        let mut out = Vector::zeros(3);
        dense.mul_to(&mapped, &mut out).unwrap();
        assert_eq!(out.to_vec(), vec![11.0 * 33.0, 22.0 * 11.0, 33.0 * 22.0]);
    }

    #[test]
    fn test_binary_with_itself() {
        let mut a = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let alias = a.view();
        a.add(&alias).unwrap();
        assert_eq!(a.to_vec(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_binary_to_destination_aliases_operand() {
        let a = Vector::from_slice(&[1.0, 2.0]);
        let b = Vector::from_slice(&[10.0, 20.0]);
        let mut to = b.view();
        a.sub_to(&b, &mut to).unwrap();
        assert_eq!(b.to_vec(), vec![-9.0, -18.0]);
    }

    #[test]
    fn test_fma() {
        let mut acc = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = Vector::from_slice(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let fresh = acc.fma_new(-1.0, &y).unwrap();
        assert_eq!(fresh.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(acc.get(0), 1.0);

        acc.fma(2.0, &y).unwrap();
        assert_eq!(acc.to_vec(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!(acc.fma(1.0, &Vector::zeros(4)).is_err());
    }

    #[test]
    fn test_cut() {
        let mut v = Vector::from_slice(&[-5.0, 5.0, 15.0]);
        v.cut(0.0, 10.0);
        assert_eq!(v.to_vec(), vec![0.0, 5.0, 10.0]);

        let mut w = Vector::from_slice(&[-5.0, 5.0, 15.0]);
        w.cut(f64::NAN, 10.0);
        assert_eq!(w.to_vec(), vec![-5.0, 5.0, 10.0]);

        let mut s = strided(&[-5.0, 5.0, 15.0]);
        s.cut(0.0, f64::NAN);
        assert_eq!(s.to_vec(), vec![0.0, 5.0, 15.0]);

        let mut to = Vector::zeros(3);
        Vector::from_slice(&[-1.0, 0.5, 2.0])
            .cut_to(0.0, 1.0, &mut to)
            .unwrap();
        assert_eq!(to.to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_apply_variants() {
        let mut v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        v.apply(|x| x * 10.0).apply_indexed(|i, x| x + i as f64);
        assert_eq!(v.to_vec(), vec![10.0, 21.0, 32.0]);

        let mut to = Vector::zeros(3);
        v.apply_to(|x| -x, &mut to).unwrap();
        assert_eq!(to.to_vec(), vec![-10.0, -21.0, -32.0]);

        to.fill_value(1.5);
        assert_eq!(to.to_vec(), vec![1.5; 3]);
    }

    #[test]
    fn test_apply_reads_aliased_views() {
        let v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let alias = v.view();
        v.view().apply(|x| x + alias.get(0));
        assert_eq!(v.to_vec(), vec![2.0, 3.0, 4.0]);

        // Closure sees the values from before the call
        let mut s = strided(&[1.0, 2.0, 3.0]);
        let head = s.map(&[0]).unwrap();
        s.apply_indexed(|i, x| x * 10.0 + head.get(0) + i as f64);
        assert_eq!(s.to_vec(), vec![11.0, 22.0, 33.0]);

        let mut to = v.view();
        v.apply_to(|x| x - alias.get(2), &mut to).unwrap();
        assert_eq!(v.to_vec(), vec![-2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_scalar_backend_matches_default() {
        let values: Vec<f64> = (0..13).map(|i| i as f64 * 0.7 - 3.0).collect();
        let mut a = Vector::from_slice(&values);
        let mut b = Vector::from_slice(&values)
            .with_backend(Backend::Scalar)
            .unwrap();
        a.exp().add_scalar(1.0).cut(0.0, 5.0);
        b.exp().add_scalar(1.0).cut(0.0, 5.0);
        assert_eq!(a.to_vec(), b.to_vec());
    }
}
