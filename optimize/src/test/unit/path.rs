use test_case::test_case;
use tessel_ir::{Dim, DimSet, Error, Op, PointwiseOp, ReduceOp, SizeDict, dims};

use crate::path::cost::memory_removed;
use crate::path::{WorkingSet, find_path, materialize};
use crate::test::helpers::*;
use crate::{CostFn, OptimizerConfig, PathStrategy};

fn chain_inputs() -> Vec<DimSet> {
    vec![dims(["a", "b"]), dims(["b", "c"]), dims(["c", "d"])]
}

fn chain_sizes() -> SizeDict {
    sizes(&[("a", 3), ("b", 4), ("c", 5), ("d", 6)])
}

fn config(strategy: PathStrategy, cost: CostFn) -> OptimizerConfig {
    OptimizerConfig::builder().strategy(strategy).cost(cost).build()
}

// ============================================================================
// Cost model
// ============================================================================

#[test_case(&["a", "b"], &["b", "c"], 28 ; "x_y")]
#[test_case(&["b", "c"], &["c", "d"], 70 ; "y_z")]
#[test_case(&["a", "b"], &["c", "d"], 318 ; "x_z")]
#[test_case(&["a"], &["a"], -3 ; "same_dims")]
fn test_memory_removed(lhs: &[&str], rhs: &[&str], expected: i128) {
    let (lhs, rhs) = (dims(lhs.iter().copied()), dims(rhs.iter().copied()));
    assert_eq!(memory_removed(&lhs, &rhs, &chain_sizes()), expected);
}

#[test]
fn test_candidate_drops_only_exhausted_dims() {
    let working = WorkingSet::new(&chain_inputs(), &dims(["b", "c"]));
    assert_eq!(working.output(), &dims(["a", "d"]));

    // `b` lives only in X and Y; `c` is still needed by Z.
    let xy = working.candidate(0, 1, &chain_sizes(), CostFn::MemoryRemoved);
    assert_eq!(xy.dropped, dims(["b"]));
    assert_eq!(xy.result, dims(["a", "c"]));
    assert_eq!((xy.cost, xy.size), (28, 15));

    let yz = working.candidate(1, 2, &chain_sizes(), CostFn::ResultSize);
    assert_eq!(yz.dropped, dims(["c"]));
    assert_eq!(yz.result, dims(["b", "d"]));
    assert_eq!((yz.cost, yz.size), (24, 24));

    // Neither shared dimension is exhausted by X and Z.
    let xz = working.candidate(0, 2, &chain_sizes(), CostFn::MemoryRemoved);
    assert!(xz.dropped.is_empty());
}

#[test]
fn test_contract_updates_appearances() {
    let mut working = WorkingSet::new(&chain_inputs(), &dims(["b", "c"]));
    assert_eq!(working.appearances(&Dim::new("c")), 2);

    let xy = working.candidate(0, 1, &chain_sizes(), CostFn::MemoryRemoved);
    working.contract(&xy);
    assert_eq!(working.len(), 2);
    assert_eq!(working.operand(0), &dims(["a", "c"]));
    assert_eq!(working.operand(1), &dims(["c", "d"]));
    assert_eq!(working.appearances(&Dim::new("b")), 0);
    assert_eq!(working.appearances(&Dim::new("c")), 2);
    assert_eq!(working.appearances(&Dim::new("a")), 1);
}

#[test]
fn test_dim_in_a_single_operand_is_dropped_at_its_first_step() {
    let inputs = vec![dims(["a", "e"]), dims(["a", "b"]), dims(["b"])];
    let working = WorkingSet::new(&inputs, &dims(["a", "b", "e"]));
    let candidate = working.candidate(0, 2, &SizeDict::uniform(&dims(["a", "b", "e"]), 2), CostFn::MemoryRemoved);
    assert_eq!(candidate.dropped, dims(["e"]));
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_greedy_picks_cheapest_pair_first() {
    let path = find_path(&chain_inputs(), &dims(["b", "c"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    assert_eq!(path.pairs(), [(0, 1), (0, 1)]);
    assert_eq!(path.steps[0].dropped, dims(["b"]));
    assert_eq!(path.steps[0].cost, 28);
    assert_eq!(path.steps[1].dropped, dims(["c"]));
    assert_eq!(path.steps[1].result_dims, dims(["a", "d"]));
    assert_eq!(path.flops, 60 + 90);
    assert_eq!(path.peak, 18);
}

#[test]
fn test_greedy_looks_past_input_order() {
    // X{a,b}, Z{c,d}, Y{b,c}: the cheap pair is (X, Y) at positions 0 and 2.
    let inputs = vec![dims(["a", "b"]), dims(["c", "d"]), dims(["b", "c"])];
    let greedy = find_path(&inputs, &dims(["b", "c"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    assert_eq!(greedy.pairs(), [(0, 2), (0, 1)]);
    assert_eq!(greedy.flops, 150);

    let sequential = config(PathStrategy::Sequential, CostFn::MemoryRemoved);
    let baseline = find_path(&inputs, &dims(["b", "c"]), &chain_sizes(), &sequential).unwrap();
    assert_eq!(baseline.pairs(), [(0, 1), (0, 1)]);
    assert!(baseline.steps[0].dropped.is_empty());
    assert_eq!(baseline.steps[1].dropped, dims(["b", "c"]));
    assert_eq!(baseline.flops, 360 + 360);
}

#[test]
fn test_result_size_cost_agrees_on_chain() {
    let path = find_path(
        &chain_inputs(),
        &dims(["b", "c"]),
        &chain_sizes(),
        &config(PathStrategy::Greedy, CostFn::ResultSize),
    )
    .unwrap();
    assert_eq!(path.pairs(), [(0, 1), (0, 1)]);
    assert_eq!(path.steps.iter().map(|s| s.cost).collect::<Vec<_>>(), [15, 18]);
}

#[test]
fn test_ties_go_to_the_first_pair() {
    let inputs = vec![dims(["a"]), dims(["b"]), dims(["c"])];
    let sizes = SizeDict::uniform(&dims(["a", "b", "c"]), 2);
    let path = find_path(&inputs, &DimSet::new(), &sizes, &OptimizerConfig::default()).unwrap();
    assert_eq!(path.pairs(), [(0, 1), (0, 1)]);
}

#[test]
fn test_single_input_has_empty_path() {
    let path = find_path(&[dims(["a", "b"])], &dims(["b"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    assert!(path.is_empty());
    assert_eq!((path.flops, path.peak), (0, 0));
}

#[test]
fn test_search_rejects_empty_input() {
    let err = find_path(&[], &DimSet::new(), &SizeDict::new(), &OptimizerConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedExpression { .. }), "{err}");
}

#[test]
fn test_search_rejects_unknown_reduced_dims() {
    let err = find_path(&chain_inputs(), &dims(["b", "z"]), &chain_sizes(), &OptimizerConfig::default()).unwrap_err();
    assert_eq!(err, Error::ReducedDimsNotFree { dims: dims(["z"]) });
}

#[test]
fn test_display_lists_steps() {
    let path = find_path(&chain_inputs(), &dims(["b", "c"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    let text = path.to_string();
    assert!(text.starts_with("0: (0, 1) drop {b} -> {a, c} cost=28"), "{text}");
    assert!(text.ends_with("flops=150 peak=18"), "{text}");
}

// ============================================================================
// Materialization
// ============================================================================

#[test]
fn test_materialize_builds_nested_contractions() {
    let chain = Chain::new();
    let path = find_path(&chain_inputs(), &dims(["b", "c"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    let tree = materialize(
        &path,
        [chain.x.clone(), chain.y.clone(), chain.z.clone()],
        ReduceOp::Add,
        PointwiseOp::Mul,
        &dims(["b", "c"]),
    )
    .unwrap();
    assert_eq!(tree, chain.expected());
}

#[test]
fn test_step_without_drops_is_a_bare_product() {
    let (x, y, z) = (leaf("X", &["a"]), leaf("Y", &["b"]), leaf("Z", &["a", "b"]));
    let inputs: Vec<_> = [&x, &y, &z].iter().map(|e| e.free_dims().clone()).collect();
    let sequential = config(PathStrategy::Sequential, CostFn::MemoryRemoved);
    let path = find_path(&inputs, &dims(["a"]), &SizeDict::uniform(&dims(["a", "b"]), 3), &sequential).unwrap();

    let tree = materialize(&path, [x.clone(), y.clone(), z.clone()], ReduceOp::Add, PointwiseOp::Mul, &dims(["a"])).unwrap();
    let Op::Reduce { src, dims: dropped, .. } = tree.op() else { panic!("expected reduce:\n{}", tree.tree()) };
    assert_eq!(dropped, &dims(["a"]));
    let Op::Elementwise { operands, .. } = src.op() else { panic!("expected elementwise") };
    assert_eq!(operands[0], elementwise(PointwiseOp::Mul, &[&x, &y]));
}

#[test]
fn test_materialize_single_operand_applies_reduction() {
    let x = leaf("X", &["a", "b"]);
    let path = find_path(&[x.free_dims().clone()], &dims(["b"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    let tree = materialize(&path, [x.clone()], ReduceOp::Max, PointwiseOp::Add, &dims(["b"])).unwrap();
    assert_eq!(tree, reduce(ReduceOp::Max, &x, &["b"]));
}

#[test]
fn test_materialize_rejects_operand_count_mismatch() {
    let chain = Chain::new();
    let path = find_path(&chain_inputs(), &dims(["b", "c"]), &chain_sizes(), &OptimizerConfig::default()).unwrap();
    let err = materialize(&path, [chain.x, chain.y], ReduceOp::Add, PointwiseOp::Mul, &dims(["b", "c"])).unwrap_err();
    assert!(matches!(err, Error::MalformedExpression { .. }), "{err}");
}
