//! Desugar: `Unary` and `Binary` input nodes become `Elementwise` nodes.
//!
//! After this pass the only pointwise node shape left is `Elementwise`, with
//! one operand for unary operators and two for binary ones. Running it again
//! is a no-op.

use std::sync::Arc;

use tessel_ir::{Expr, NodeKind, Op};

use crate::{Pass, Registry};

pub const NAME: &str = "desugar";

/// Register the desugar handlers in `registry`.
pub fn desugar_pass(registry: &Arc<Registry>) -> Pass {
    let pass = Pass::new(NAME, Arc::clone(registry));

    pass.register(NodeKind::Unary, |node, _| match node.op() {
        Op::Unary(op, src) => Expr::try_elementwise(*op, [Arc::clone(src)]).map(Some),
        _ => Ok(None),
    });

    pass.register(NodeKind::Binary, |node, _| match node.op() {
        Op::Binary(op, lhs, rhs) => Expr::try_elementwise(*op, [Arc::clone(lhs), Arc::clone(rhs)]).map(Some),
        _ => Ok(None),
    });

    pass
}
