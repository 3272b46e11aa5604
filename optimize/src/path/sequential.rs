//! Left-to-right pairing: `((a ⊗ b) ⊗ c) ⊗ ...`.

use tessel_ir::SizeDict;

use super::{Candidate, WorkingSet};
use crate::CostFn;

/// Always the first two working operands. Requires at least two operands.
pub fn first_pair(working: &WorkingSet, sizes: &SizeDict, cost: CostFn) -> Candidate {
    working.candidate(0, 1, sizes, cost)
}
