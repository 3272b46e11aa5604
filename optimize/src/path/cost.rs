//! Pair cost functions.

use tessel_ir::{DimSet, SizeDict};

use crate::CostFn;

/// Cost of combining two working operands. Lower is better.
///
/// `result` is the pair's free dimensions after its droppable dimensions have
/// been reduced away.
pub fn pair_cost(cost: CostFn, lhs: &DimSet, rhs: &DimSet, result: &DimSet, sizes: &SizeDict) -> i128 {
    match cost {
        CostFn::MemoryRemoved => memory_removed(lhs, rhs, sizes),
        CostFn::ResultSize => i128::from(sizes.size_of(result)),
    }
}

/// `size(lhs ∪ rhs) - size(lhs) - size(rhs)`.
///
/// Negative when the naive product is smaller than its inputs combined, i.e.
/// the pair shrinks the working set.
pub fn memory_removed(lhs: &DimSet, rhs: &DimSet, sizes: &SizeDict) -> i128 {
    let union = sizes.size_of(lhs.union(rhs));
    i128::from(union) - i128::from(sizes.size_of(lhs)) - i128::from(sizes.size_of(rhs))
}
