//! Bottom-up tree rewrite with an explicit stack.
//!
//! # Algorithm
//!
//! Every node passes through two stages:
//! - `Descend`: schedule the node's own `Finalize`, then its children
//! - `Finalize`: rebuild the node over its rewritten children, then hand it to
//!   the rewrite callback
//!
//! Because the stack is LIFO, a node's `Finalize` always runs after every
//! child has been finalized. Results are keyed by node id, so a subtree shared
//! through `Arc` is rewritten once and the rewritten copy is shared in turn.
//!
//! Depth is bounded by the heap, not the call stack, so adversarially deep
//! trees are fine.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::OptionExt;

use crate::error::{MalformedExpressionSnafu, Result};
use crate::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Descend,
    Finalize,
}

#[derive(Debug)]
struct StackEntry {
    node: Arc<Expr>,
    stage: Stage,
}

impl StackEntry {
    fn descend(node: Arc<Expr>) -> Self {
        Self { node, stage: Stage::Descend }
    }

    fn finalize(node: Arc<Expr>) -> Self {
        Self { node, stage: Stage::Finalize }
    }
}

/// Rewrite `root` bottom-up.
///
/// `rewrite` sees each node after its children have been rewritten and
/// returns `Some(replacement)` or `None` to keep it. A node whose children are
/// all unchanged is passed as-is (same `Arc`), so untouched subtrees are
/// shared with the input. The first error aborts the walk.
pub fn rewrite_bottom_up<F>(root: &Arc<Expr>, mut rewrite: F) -> Result<Arc<Expr>>
where
    F: FnMut(&Arc<Expr>) -> Result<Option<Arc<Expr>>>,
{
    let mut results: HashMap<u64, Arc<Expr>> = HashMap::new();
    let mut stack = vec![StackEntry::descend(root.clone())];

    while let Some(StackEntry { node, stage }) = stack.pop() {
        if results.contains_key(&node.id) {
            continue;
        }

        match stage {
            Stage::Descend => {
                let sources = node.sources();
                let pending: SmallVec<[Arc<Expr>; 4]> =
                    sources.iter().rev().filter(|child| !results.contains_key(&child.id)).map(|c| Arc::clone(c)).collect();
                drop(sources);
                stack.push(StackEntry::finalize(node));
                stack.extend(pending.into_iter().map(StackEntry::descend));
            }
            Stage::Finalize => {
                let sources = node.sources();
                let mut children: SmallVec<[Arc<Expr>; 4]> = SmallVec::with_capacity(sources.len());
                for child in &sources {
                    let done = results.get(&child.id).context(MalformedExpressionSnafu {
                        reason: format!("child [{}] of [{}] finalized out of order", child.id, node.id),
                    })?;
                    children.push(done.clone());
                }

                let changed = children.iter().zip(&sources).any(|(new, old)| !Arc::ptr_eq(new, old));
                let rebuilt = if changed { node.with_sources(&children)? } else { node.clone() };

                let result = match rewrite(&rebuilt)? {
                    Some(replacement) => {
                        tracing::trace!(node.id = node.id, replacement.id = replacement.id, kind = %rebuilt.kind(), "node rewritten");
                        replacement
                    }
                    None => rebuilt,
                };
                results.insert(node.id, result);
            }
        }
    }

    results.remove(&root.id).context(MalformedExpressionSnafu { reason: "rewrite produced no result for the root" })
}
