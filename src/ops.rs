//! Operator tags for elementwise kernels
//!
//! Each tag pairs a lane kernel (in [`crate::backends`]) with the scalar
//! function used for remainders and for the layout-agnostic path. Both paths
//! look the operator up here, so they always agree on what an operator means.

/// Elementwise unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Natural logarithm
    Log,
    /// `ln(1 + x)`
    Log1p,
    /// Base-10 logarithm
    Log10,
    /// Absolute value
    Abs,
    /// Negation
    Neg,
    /// Sine
    Sin,
    /// Cosine
    Cos,
    /// Tangent
    Tan,
    /// Arc sine
    Asin,
    /// Arc cosine
    Acos,
    /// Arc tangent
    Atan,
    /// Hyperbolic sine
    Sinh,
    /// Hyperbolic cosine
    Cosh,
    /// Hyperbolic tangent
    Tanh,
    /// `e^x`
    Exp,
    /// `e^x - 1`
    Expm1,
    /// Square root
    Sqrt,
    /// Cube root
    Cbrt,
}

impl UnaryOp {
    /// Every unary operator, in declaration order
    pub const ALL: [UnaryOp; 18] = [
        UnaryOp::Log,
        UnaryOp::Log1p,
        UnaryOp::Log10,
        UnaryOp::Abs,
        UnaryOp::Neg,
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Tan,
        UnaryOp::Asin,
        UnaryOp::Acos,
        UnaryOp::Atan,
        UnaryOp::Sinh,
        UnaryOp::Cosh,
        UnaryOp::Tanh,
        UnaryOp::Exp,
        UnaryOp::Expm1,
        UnaryOp::Sqrt,
        UnaryOp::Cbrt,
    ];

    /// Scalar function for this operator
    pub fn scalar(self) -> fn(f64) -> f64 {
        match self {
            UnaryOp::Log => f64::ln,
            UnaryOp::Log1p => f64::ln_1p,
            UnaryOp::Log10 => f64::log10,
            UnaryOp::Abs => f64::abs,
            UnaryOp::Neg => |x| -x,
            UnaryOp::Sin => f64::sin,
            UnaryOp::Cos => f64::cos,
            UnaryOp::Tan => f64::tan,
            UnaryOp::Asin => f64::asin,
            UnaryOp::Acos => f64::acos,
            UnaryOp::Atan => f64::atan,
            UnaryOp::Sinh => f64::sinh,
            UnaryOp::Cosh => f64::cosh,
            UnaryOp::Tanh => f64::tanh,
            UnaryOp::Exp => f64::exp,
            UnaryOp::Expm1 => f64::exp_m1,
            UnaryOp::Sqrt => f64::sqrt,
            UnaryOp::Cbrt => f64::cbrt,
        }
    }

    /// Apply the scalar function
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        (self.scalar())(x)
    }

    /// Operator name, as used in method names
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Log => "log",
            UnaryOp::Log1p => "log1p",
            UnaryOp::Log10 => "log10",
            UnaryOp::Abs => "abs",
            UnaryOp::Neg => "neg",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Exp => "exp",
            UnaryOp::Expm1 => "expm1",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Cbrt => "cbrt",
        }
    }

    /// Whether backends implement this operator with native SIMD instructions
    ///
    /// The remaining operators run lane-by-lane through the scalar function.
    pub fn has_native_lanes(self) -> bool {
        matches!(self, UnaryOp::Abs | UnaryOp::Neg | UnaryOp::Sqrt)
    }
}

/// Elementwise binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
}

impl BinaryOp {
    /// Every binary operator, in declaration order
    pub const ALL: [BinaryOp; 4] = [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div];

    /// Scalar function for this operator
    pub fn scalar(self) -> fn(f64, f64) -> f64 {
        match self {
            BinaryOp::Add => |a, b| a + b,
            BinaryOp::Sub => |a, b| a - b,
            BinaryOp::Mul => |a, b| a * b,
            BinaryOp::Div => |a, b| a / b,
        }
    }

    /// Apply the scalar function
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        (self.scalar())(a, b)
    }

    /// Operator name, used as the error context for conformance failures
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }
}
