//! Optimize: split wide reductions of products into pairwise contractions.
//!
//! Handles `Reduce(r, Elementwise(e, operands), dims)` where `r` distributes
//! over `e`. The operands' dimension sets go through [`find_path`]; the path
//! is then materialized into nested `Reduce(r, Elementwise(e, [lhs, rhs]), ..)`
//! nodes. Any other reduction is reflected unchanged, as is a product of two
//! operands (its only path is the node itself). Cardinalities are required
//! for every product this pass accepts, whatever its operand count.

use std::sync::Arc;

use snafu::ensure;
use tessel_ir::error::MalformedExpressionSnafu;
use tessel_ir::{Expr, NodeKind, Op, PassOutput, ShapeProvider, SizeDict};
use tracing::{debug, trace};

use crate::path::{find_path, materialize};
use crate::{OptimizerConfig, Pass, Registry};

pub const NAME: &str = "optimize";

pub fn optimize_pass(registry: &Arc<Registry>, config: OptimizerConfig) -> Pass {
    let pass = Pass::new(NAME, Arc::clone(registry));
    pass.register(NodeKind::Reduce, move |node, shapes| contract_reduce(node, shapes, &config));
    pass
}

fn contract_reduce(node: &Arc<Expr>, shapes: &dyn ShapeProvider, config: &OptimizerConfig) -> PassOutput {
    let Op::Reduce { op: reduce_op, src, dims } = node.op() else { return Ok(None) };
    let Op::Elementwise { op: inner_op, operands } = src.op() else {
        trace!(node.id = node.id, src = %src.kind(), "reduction over a non-product, reflected");
        return Ok(None);
    };
    if !inner_op.is_associative() || !reduce_op.distributes_over(*inner_op) {
        trace!(node.id = node.id, %reduce_op, %inner_op, "reduction does not distribute, reflected");
        return Ok(None);
    }
    ensure!(
        !operands.is_empty(),
        MalformedExpressionSnafu { reason: format!("reduction [{}] over an empty product", node.id) }
    );
    let sizes = SizeDict::collect(src.free_dims(), shapes)?;
    if operands.len() <= 2 {
        return Ok(None);
    }

    let inputs: Vec<_> = operands.iter().map(|o| o.free_dims().clone()).collect();
    let path = find_path(&inputs, dims, &sizes, config)?;
    debug!(node.id = node.id, steps = path.len(), flops = path.flops, peak = path.peak, "contraction path\n{path}");

    let result = materialize(&path, operands.iter().cloned(), *reduce_op, *inner_op, dims)?;
    ensure!(
        result.free_dims() == node.free_dims(),
        MalformedExpressionSnafu {
            reason: format!(
                "contraction of [{}] left {:?} free, expected {:?}",
                node.id,
                result.free_dims(),
                node.free_dims()
            ),
        }
    );
    Ok(Some(result))
}
