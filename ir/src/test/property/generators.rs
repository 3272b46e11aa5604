//! Generators for property-based testing.
//!
//! Trees draw their dimensions from a small fixed pool so that operands
//! overlap often, which is where contraction ordering gets interesting.

use std::sync::Arc;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use strum::VariantArray;

use crate::{DimSet, Expr, Operand, PointwiseOp, ReduceOp, SizeDict, dims};

pub const DIM_POOL: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

// ============================================================================
// Operators
// ============================================================================

fn pointwise_where(keep: impl Fn(PointwiseOp) -> bool) -> Vec<PointwiseOp> {
    PointwiseOp::VARIANTS.iter().copied().filter(|op| keep(*op)).collect()
}

pub fn arb_unary_op() -> impl Strategy<Value = PointwiseOp> {
    select(pointwise_where(|op| op.arity().accepts(1) && !op.is_associative()))
}

/// Any operator that accepts exactly two operands (binary or associative).
pub fn arb_binary_op() -> impl Strategy<Value = PointwiseOp> {
    select(pointwise_where(|op| op.arity().accepts(2)))
}

pub fn arb_associative_op() -> impl Strategy<Value = PointwiseOp> {
    select(pointwise_where(PointwiseOp::is_associative))
}

pub fn arb_reduce_op() -> impl Strategy<Value = ReduceOp> {
    select(ReduceOp::VARIANTS.to_vec())
}

/// `(reduction, product)` pairs where the reduction distributes over the product.
pub fn arb_semiring() -> impl Strategy<Value = (ReduceOp, PointwiseOp)> {
    let pairs: Vec<_> = ReduceOp::VARIANTS
        .iter()
        .flat_map(|r| PointwiseOp::VARIANTS.iter().filter(move |p| r.distributes_over(**p)).map(move |p| (*r, *p)))
        .collect();
    select(pairs)
}

// ============================================================================
// Dimensions
// ============================================================================

pub fn arb_dims(max: usize) -> impl Strategy<Value = DimSet> {
    subsequence(DIM_POOL.to_vec(), 0..=max).prop_map(|names| dims(names))
}

/// Cardinalities in `1..=6` for every pool dimension.
pub fn arb_sizes() -> impl Strategy<Value = SizeDict> {
    vec(1u64..=6, DIM_POOL.len()).prop_map(|sizes| DIM_POOL.iter().copied().zip(sizes).collect())
}

/// Keep the free dims of `src` selected by the bits of `mask`.
pub fn subset_by_mask(src: &Expr, mask: u8) -> DimSet {
    src.free_dims().iter().enumerate().filter(|(i, _)| (mask >> (i % 8)) & 1 == 1).map(|(_, d)| d.clone()).collect()
}

// ============================================================================
// Trees
// ============================================================================

pub fn arb_leaf() -> impl Strategy<Value = Arc<Expr>> {
    (0u32..1000, arb_dims(3)).prop_map(|(n, dims)| Expr::leaf(Operand::new(format!("x{n}"), dims)))
}

/// Tree mixing every node variant, up to `depth` levels above the leaves.
pub fn arb_expr(depth: u32) -> impl Strategy<Value = Arc<Expr>> {
    arb_leaf().prop_recursive(depth, depth * 4, 4, |inner| {
        prop_oneof![
            (arb_unary_op(), inner.clone()).prop_map(|(op, src)| Expr::try_unary(op, src).unwrap()),
            (arb_binary_op(), inner.clone(), inner.clone())
                .prop_map(|(op, lhs, rhs)| Expr::try_binary(op, lhs, rhs).unwrap()),
            (arb_associative_op(), vec(inner.clone(), 1..=4))
                .prop_map(|(op, operands)| Expr::try_elementwise(op, operands).unwrap()),
            (arb_reduce_op(), inner, any::<u8>()).prop_map(|(op, src, mask)| {
                let dims = subset_by_mask(&src, mask);
                Expr::try_reduce(op, src, dims).unwrap()
            }),
        ]
    })
}

/// `Reduce(r, Elementwise(p, leaves), dims)` for a distributive pair `(r, p)`.
pub fn arb_contraction(max_operands: usize) -> impl Strategy<Value = Arc<Expr>> {
    (arb_semiring(), vec(arb_leaf(), 2..=max_operands), any::<u8>()).prop_map(|((reduce, product), leaves, mask)| {
        let product = Expr::try_elementwise(product, leaves).unwrap();
        let dims = subset_by_mask(&product, mask);
        Expr::try_reduce(reduce, product, dims).unwrap()
    })
}
