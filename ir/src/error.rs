use snafu::Snafu;

use crate::{Arity, Dim, DimSet, PointwiseOp};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A dimension has no known cardinality.
    ///
    /// Recoverable: run shape inference over the leaves, then retry.
    #[snafu(display("no cardinality known for dimension '{dim}'; run shape inference first"))]
    ShapeMetadataMissing { dim: Dim },

    /// A dimension was reported with cardinality zero.
    #[snafu(display("dimension '{dim}' has cardinality 0"))]
    InvalidCardinality { dim: Dim },

    /// The tree violates a structural invariant that no pass can repair.
    #[snafu(display("malformed expression: {reason}"))]
    MalformedExpression { reason: String },

    /// Pointwise node built with no operands.
    #[snafu(display("{op} requires at least one operand"))]
    EmptyOperands { op: PointwiseOp },

    /// Pointwise node built with the wrong number of operands.
    #[snafu(display("{op} expects {expected:?} operands, got {actual}"))]
    ArityMismatch { op: PointwiseOp, expected: Arity, actual: usize },

    /// Reduction over dimensions its operand does not have.
    #[snafu(display("cannot reduce over {dims:?}: not free in the operand"))]
    ReducedDimsNotFree { dims: DimSet },

    /// Handler lookup failed for a reason other than "no handler".
    #[snafu(display("dispatch failed: {source}"))]
    Dispatch { source: tessel_dispatch::Error },
}
