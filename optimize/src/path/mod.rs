//! Contraction path search.
//!
//! A reduction over an n-ary product `reduce(op, a ⊗ b ⊗ c ⊗ ..., dims)` can be
//! evaluated as a chain of pairwise products, reducing each dimension as soon
//! as no operand left outside the running partial result mentions it. The
//! order of the pairs decides the size of every intermediate; finding the best
//! order is the contraction path problem.
//!
//! The search works on dimension sets only. [`find_path`] produces a
//! [`ContractionPath`]; [`materialize`] replays it over the actual operand
//! nodes.
//!
//! # Working set
//!
//! The search keeps an ordered list of working operands (initially the inputs)
//! and, per dimension, the number of working operands that mention it. A step
//! combines positions `lhs < rhs`: the result replaces `lhs` and `rhs` is
//! removed. A dimension is dropped at a step when it is being reduced and both
//! of its remaining mentions (or its only one) are inside the pair. That
//! count is what keeps a shared dimension from being reduced before every
//! operand that mentions it has been folded in.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use snafu::ensure;
use tessel_ir::error::{MalformedExpressionSnafu, ReducedDimsNotFreeSnafu};
use tessel_ir::{Dim, DimSet, Expr, PointwiseOp, ReduceOp, SizeDict};
use tracing::{debug, trace};

use crate::{CostFn, OptimizerConfig, PathStrategy, Result};

pub mod cost;
pub mod greedy;
pub mod sequential;

// ============================================================================
// PATH
// ============================================================================

/// One pairwise contraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Working-list position of the left operand. The result takes this slot.
    pub lhs: usize,
    /// Working-list position of the right operand, always `> lhs`. Removed.
    pub rhs: usize,
    /// Dimensions reduced away right after the pair is combined.
    pub dropped: DimSet,
    /// Free dimensions of the step's result.
    pub result_dims: DimSet,
    /// Cost the strategy assigned to the pair.
    pub cost: i128,
}

/// Ordered pairwise contractions plus cost estimates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractionPath {
    pub steps: Vec<PathStep>,
    /// Sum over steps of the naive product size `size(lhs ∪ rhs)`.
    pub flops: u64,
    /// Largest intermediate produced by any step, after its reductions.
    pub peak: u64,
}

impl ContractionPath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step positions as `(lhs, rhs)` pairs.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.steps.iter().map(|s| (s.lhs, s.rhs)).collect()
    }
}

impl fmt::Display for ContractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(
                f,
                "{i}: ({}, {}) drop {:?} -> {:?} cost={}",
                step.lhs, step.rhs, step.dropped, step.result_dims, step.cost
            )?;
        }
        write!(f, "flops={} peak={}", self.flops, self.peak)
    }
}

// ============================================================================
// WORKING SET
// ============================================================================

/// Evaluated pair: what combining `lhs` and `rhs` would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub lhs: usize,
    pub rhs: usize,
    pub dropped: DimSet,
    pub result: DimSet,
    pub cost: i128,
    /// Element count of `result`.
    pub size: u64,
}

impl Candidate {
    /// Greedy ranking key.
    fn rank(&self) -> (i128, u64) {
        (self.cost, self.size)
    }
}

/// Operands not yet combined, with per-dimension mention counts.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    operands: Vec<DimSet>,
    appearances: HashMap<Dim, usize>,
    output: DimSet,
}

impl WorkingSet {
    pub fn new(inputs: &[DimSet], reduced: &DimSet) -> Self {
        let mut appearances: HashMap<Dim, usize> = HashMap::new();
        for dim in inputs.iter().flatten() {
            *appearances.entry(dim.clone()).or_default() += 1;
        }
        let output = appearances.keys().filter(|d| !reduced.contains(*d)).cloned().collect();
        Self { operands: inputs.to_vec(), appearances, output }
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn operand(&self, index: usize) -> &DimSet {
        &self.operands[index]
    }

    /// Dimensions that survive the whole contraction.
    pub fn output(&self) -> &DimSet {
        &self.output
    }

    /// Number of working operands mentioning `dim`.
    pub fn appearances(&self, dim: &Dim) -> usize {
        self.appearances.get(dim).copied().unwrap_or(0)
    }

    /// Evaluate combining positions `lhs < rhs`.
    pub fn candidate(&self, lhs: usize, rhs: usize, sizes: &SizeDict, cost: CostFn) -> Candidate {
        let (a, b) = (&self.operands[lhs], &self.operands[rhs]);
        let mut dropped = DimSet::new();
        let mut result = DimSet::new();
        for dim in a.union(b) {
            let in_pair = usize::from(a.contains(dim)) + usize::from(b.contains(dim));
            if !self.output.contains(dim) && self.appearances(dim) == in_pair {
                dropped.insert(dim.clone());
            } else {
                result.insert(dim.clone());
            }
        }
        let cost = cost::pair_cost(cost, a, b, &result, sizes);
        let size = sizes.size_of(&result);
        Candidate { lhs, rhs, dropped, result, cost, size }
    }

    /// Replace `lhs` with the candidate's result and remove `rhs`.
    pub fn contract(&mut self, candidate: &Candidate) {
        let rhs = self.operands.remove(candidate.rhs);
        let lhs = std::mem::replace(&mut self.operands[candidate.lhs], candidate.result.clone());
        for dim in lhs.iter().chain(&rhs) {
            if let Some(count) = self.appearances.get_mut(dim) {
                *count -= 1;
            }
        }
        for dim in &candidate.result {
            *self.appearances.entry(dim.clone()).or_default() += 1;
        }
    }
}

// ============================================================================
// SEARCH
// ============================================================================

/// Find a pairwise contraction order for operands with free dimensions
/// `inputs`, reducing over `reduced`.
///
/// Every dimension in `reduced` is dropped exactly once, except with a single
/// input where there is nothing to pair (see [`materialize`]).
#[tracing::instrument(skip_all, fields(operands = inputs.len(), strategy = %config.strategy, cost = %config.cost))]
pub fn find_path(
    inputs: &[DimSet],
    reduced: &DimSet,
    sizes: &SizeDict,
    config: &OptimizerConfig,
) -> Result<ContractionPath> {
    ensure!(!inputs.is_empty(), MalformedExpressionSnafu { reason: "contraction over an empty operand list" });
    let stray: DimSet = reduced.iter().filter(|d| !inputs.iter().any(|i| i.contains(*d))).cloned().collect();
    ensure!(stray.is_empty(), ReducedDimsNotFreeSnafu { dims: stray });

    let mut working = WorkingSet::new(inputs, reduced);
    let mut path = ContractionPath { steps: Vec::with_capacity(inputs.len() - 1), ..Default::default() };
    trace!(output = ?working.output(), "starting search");

    while working.len() > 1 {
        let pick = match config.strategy {
            PathStrategy::Greedy => greedy::best_pair(&working, sizes, config.cost),
            PathStrategy::Sequential => sequential::first_pair(&working, sizes, config.cost),
        };

        let naive = sizes.size_of(working.operand(pick.lhs).union(working.operand(pick.rhs)));
        path.flops = path.flops.saturating_add(naive);
        path.peak = path.peak.max(pick.size);
        debug!(lhs = pick.lhs, rhs = pick.rhs, dropped = ?pick.dropped, result = ?pick.result, cost = pick.cost, "step");

        working.contract(&pick);
        path.steps.push(PathStep {
            lhs: pick.lhs,
            rhs: pick.rhs,
            dropped: pick.dropped,
            result_dims: pick.result,
            cost: pick.cost,
        });
    }

    Ok(path)
}

/// Build the nested tree that `path` describes over `operands`.
///
/// A step with dropped dimensions becomes `Reduce(reduce_op,
/// Elementwise(inner_op, [lhs, rhs]), dropped)`; a step with none becomes the
/// bare `Elementwise`. Dimensions of `reduced` still free at the end (only
/// possible with a single operand) are reduced by a final wrapping node.
pub fn materialize(
    path: &ContractionPath,
    operands: impl IntoIterator<Item = Arc<Expr>>,
    reduce_op: ReduceOp,
    inner_op: PointwiseOp,
    reduced: &DimSet,
) -> Result<Arc<Expr>> {
    let mut working: Vec<Arc<Expr>> = operands.into_iter().collect();
    ensure!(
        working.len() == path.len() + 1,
        MalformedExpressionSnafu {
            reason: format!("path of {} steps replayed over {} operands", path.len(), working.len()),
        }
    );

    for step in &path.steps {
        ensure!(
            step.lhs < step.rhs && step.rhs < working.len(),
            MalformedExpressionSnafu {
                reason: format!("step ({}, {}) out of range for {} operands", step.lhs, step.rhs, working.len()),
            }
        );
        let rhs = working.remove(step.rhs);
        let lhs = Arc::clone(&working[step.lhs]);
        let product = Expr::try_elementwise(inner_op, [lhs, rhs])?;
        working[step.lhs] =
            if step.dropped.is_empty() { product } else { Expr::try_reduce(reduce_op, product, step.dropped.clone())? };
    }

    let Some(result) = working.pop() else {
        return MalformedExpressionSnafu { reason: "path consumed every operand" }.fail();
    };
    let leftover: DimSet = reduced.intersection(result.free_dims()).cloned().collect();
    if leftover.is_empty() { Ok(result) } else { Expr::try_reduce(reduce_op, result, leftover) }
}
