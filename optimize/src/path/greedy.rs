//! Greedy pair selection.
//!
//! Every step scans all `i < j` pairs of the working set and takes the one
//! with the lowest `(cost, result size)`. The comparison is strict, so among
//! equal keys the first pair in scan order wins and the path is deterministic.
//!
//! O(n²) candidates per step and n - 1 steps: cubic overall, which is fine for
//! the operand counts a single product carries.

use tessel_ir::SizeDict;
use tracing::trace;

use super::{Candidate, WorkingSet};
use crate::CostFn;

/// Cheapest pair of the working set. Requires at least two operands.
pub fn best_pair(working: &WorkingSet, sizes: &SizeDict, cost: CostFn) -> Candidate {
    let mut best: Option<Candidate> = None;
    for lhs in 0..working.len() {
        for rhs in lhs + 1..working.len() {
            let candidate = working.candidate(lhs, rhs, sizes, cost);
            trace!(lhs, rhs, cost = candidate.cost, size = candidate.size, "candidate");
            if best.as_ref().is_none_or(|b| candidate.rank() < b.rank()) {
                best = Some(candidate);
            }
        }
    }
    best.unwrap_or_else(|| working.candidate(0, 1, sizes, cost))
}
