//! Expression trees for the tessel rewrite pipeline.
//!
//! # Module Organization
//!
//! - [`dim`] - Named dimensions, cardinalities, and the [`ShapeProvider`] boundary
//! - [`ops`] - Pointwise and reduction operator catalog
//! - [`expr`] - [`Expr`] nodes and their checked constructors
//! - [`kind`] - Node taxonomy used to dispatch pass handlers
//! - [`tree`] - ASCII rendering
//! - [`rewrite`] - Bottom-up rewrite engine and named passes
//! - [`error`] - Error types and result handling

pub mod dim;
pub mod error;
pub mod expr;
pub mod kind;
pub mod ops;
pub mod rewrite;
pub mod tree;


pub use dim::{Dim, DimSet, ShapeProvider, SizeDict, dims};
pub use error::{Error, Result};
pub use expr::{Expr, Op, Operand, Payload};
pub use kind::{EXPR, NodeKind, POINTWISE, node_hierarchy};
pub use ops::{Arity, PointwiseOp, ReduceOp};
pub use rewrite::{PassOutput, PassRegistry, RewritePass, pass_registry, rewrite_bottom_up};
