//! Operator catalog.
//!
//! Operators are opaque tags: this crate never evaluates them. The only facts
//! it needs are how many operands each accepts, which pointwise operators may
//! be flattened and reordered, and which reductions distribute over which
//! pointwise operators.

/// Number of operands a pointwise operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
    /// One or more operands, folded left to right.
    Variadic,
}

impl Arity {
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Unary => count == 1,
            Self::Binary => count == 2,
            Self::Variadic => count >= 1,
        }
    }
}

/// Pointwise operation applied independently at every index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PointwiseOp {
    /// Negation: -x
    Neg,
    /// Natural exponential: e^x
    Exp,
    /// Natural logarithm: ln(x)
    Log,
    Abs,
    Sqrt,

    /// Subtraction: a - b
    Sub,
    /// Division: a / b
    Div,
    /// Power: a^b
    Pow,

    /// Addition: a + b + ...
    Add,
    /// Multiplication: a * b * ...
    Mul,
    Max,
    Min,
    /// Logical and.
    And,
    /// Logical or.
    Or,
    /// log(e^a + e^b + ...)
    LogAddExp,
}

impl PointwiseOp {
    pub const fn arity(self) -> Arity {
        match self {
            Self::Neg | Self::Exp | Self::Log | Self::Abs | Self::Sqrt => Arity::Unary,
            Self::Sub | Self::Div | Self::Pow => Arity::Binary,
            Self::Add | Self::Mul | Self::Max | Self::Min | Self::And | Self::Or | Self::LogAddExp => Arity::Variadic,
        }
    }

    /// Whether nested applications may be flattened into one operand list and
    /// that list reordered freely (associative and commutative).
    pub const fn is_associative(self) -> bool {
        matches!(self.arity(), Arity::Variadic)
    }
}

/// Associative-commutative fold applied over a set of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ReduceOp {
    /// Sum.
    Add,
    /// Product.
    Mul,
    Max,
    Min,
    And,
    Or,
    LogAddExp,
}

impl ReduceOp {
    /// Pointwise operator that folds two partial reductions together.
    pub const fn pointwise(self) -> PointwiseOp {
        match self {
            Self::Add => PointwiseOp::Add,
            Self::Mul => PointwiseOp::Mul,
            Self::Max => PointwiseOp::Max,
            Self::Min => PointwiseOp::Min,
            Self::And => PointwiseOp::And,
            Self::Or => PointwiseOp::Or,
            Self::LogAddExp => PointwiseOp::LogAddExp,
        }
    }

    /// Whether `reduce(x ⊗ y) = reduce(x) ⊗ y` for any `y` not mentioning the
    /// reduced dimensions, where `⊗` is `op`.
    ///
    /// This is the semiring condition that lets a reduction be pushed inside
    /// a product and split into pairwise contractions.
    pub const fn distributes_over(self, op: PointwiseOp) -> bool {
        matches!(
            (self, op),
            (Self::Add, PointwiseOp::Mul)
                | (Self::Max | Self::Min | Self::LogAddExp, PointwiseOp::Add)
                | (Self::Max, PointwiseOp::Min)
                | (Self::Min, PointwiseOp::Max)
                | (Self::Or, PointwiseOp::And)
                | (Self::And, PointwiseOp::Or)
        )
    }
}

impl From<ReduceOp> for PointwiseOp {
    fn from(op: ReduceOp) -> Self {
        op.pointwise()
    }
}
