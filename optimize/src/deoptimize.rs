//! Deoptimize: merge nested nodes into the widest reduction-of-product units.
//!
//! - `Elementwise(op, [.., Elementwise(op, xs), ..])` → `Elementwise(op, [.., xs.., ..])`
//!   when `op` is associative
//! - `Reduce(op, Reduce(op, x, d1), d2)` → `Reduce(op, x, d1 ∪ d2)`
//!
//! Operators must match exactly; anything else is left alone. Since children
//! are rewritten first, merging one level is enough to leave no parent/child
//! pair sharing an operator.

use std::sync::Arc;

use smallvec::SmallVec;
use tessel_ir::{Expr, NodeKind, Op, PassOutput};

use crate::{Pass, Registry};

pub const NAME: &str = "deoptimize";

pub fn deoptimize_pass(registry: &Arc<Registry>) -> Pass {
    let pass = Pass::new(NAME, Arc::clone(registry));
    pass.register(NodeKind::Elementwise, |node, _| flatten_elementwise(node));
    pass.register(NodeKind::Reduce, |node, _| merge_reduce(node));
    pass
}

fn flatten_elementwise(node: &Arc<Expr>) -> PassOutput {
    let Op::Elementwise { op, operands } = node.op() else { return Ok(None) };
    let same_op = |child: &Arc<Expr>| matches!(child.op(), Op::Elementwise { op: inner, .. } if inner == op);
    if !op.is_associative() || !operands.iter().any(same_op) {
        return Ok(None);
    }

    let mut flat: SmallVec<[Arc<Expr>; 8]> = SmallVec::new();
    for child in operands {
        match child.op() {
            Op::Elementwise { op: inner, operands: nested } if inner == op => flat.extend(nested.iter().cloned()),
            _ => flat.push(Arc::clone(child)),
        }
    }
    tracing::trace!(node.id = node.id, %op, before = operands.len(), after = flat.len(), "flattened");
    Expr::try_elementwise(*op, flat).map(Some)
}

fn merge_reduce(node: &Arc<Expr>) -> PassOutput {
    let Op::Reduce { op, src, dims } = node.op() else { return Ok(None) };
    match src.op() {
        Op::Reduce { op: inner, src: inner_src, dims: inner_dims } if inner == op => {
            let merged = inner_dims.union(dims).cloned().collect();
            Expr::try_reduce(*op, Arc::clone(inner_src), merged).map(Some)
        }
        _ => Ok(None),
    }
}
