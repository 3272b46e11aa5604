//! Expression tree nodes.
//!
//! An [`Expr`] is immutable once built. Rewrites produce new nodes and share
//! untouched subtrees through `Arc`, so a pass is a pure function from tree to
//! tree.
//!
//! Free dimensions are computed eagerly at construction, which is also where
//! every structural invariant is checked: operand counts match the operator's
//! arity and a reduction only names dimensions its operand actually has.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use snafu::ensure;
use tessel_dispatch::{Classify, TypeKey};

use crate::error::{ArityMismatchSnafu, EmptyOperandsSnafu, MalformedExpressionSnafu, ReducedDimsNotFreeSnafu, Result};
use crate::{Arity, DimSet, NodeKind, PointwiseOp, ReduceOp};

static EXPR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_expr_id() -> u64 {
    EXPR_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Opaque payload attached to a leaf by the numeric backend.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Terminal operand: a named value spanning a set of dimensions.
#[derive(derive_more::Debug, Clone)]
pub struct Operand {
    pub name: Arc<str>,
    pub dims: DimSet,
    #[debug(skip)]
    pub payload: Option<Payload>,
}

impl Operand {
    pub fn new(name: impl AsRef<str>, dims: DimSet) -> Self {
        Self { name: Arc::from(name.as_ref()), dims, payload: None }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Downcast the payload, if there is one of type `T`.
    pub fn downcast_payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

/// Leaves compare by name and dimensions; payloads only by identity.
impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        let same_payload = match (&self.payload, &other.payload) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.name == other.name && self.dims == other.dims && same_payload
    }
}

impl Eq for Operand {}

/// Operation carried by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Leaf(Operand),
    /// `op(src)`, the input form of a unary pointwise operator.
    Unary(PointwiseOp, Arc<Expr>),
    /// `op(lhs, rhs)`, the input form of a binary pointwise operator.
    Binary(PointwiseOp, Arc<Expr>, Arc<Expr>),
    /// Canonical pointwise form over an ordered operand list.
    Elementwise { op: PointwiseOp, operands: SmallVec<[Arc<Expr>; 4]> },
    /// Fold `op` over `dims` of `src`.
    Reduce { op: ReduceOp, src: Arc<Expr>, dims: DimSet },
}

impl Op {
    /// Direct children, in order.
    pub fn sources(&self) -> SmallVec<[&Arc<Expr>; 4]> {
        match self {
            Self::Leaf(_) => SmallVec::new(),
            Self::Unary(_, src) | Self::Reduce { src, .. } => SmallVec::from_slice(&[src]),
            Self::Binary(_, lhs, rhs) => SmallVec::from_slice(&[lhs, rhs]),
            Self::Elementwise { operands, .. } => operands.iter().collect(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Unary(..) => NodeKind::Unary,
            Self::Binary(..) => NodeKind::Binary,
            Self::Elementwise { .. } => NodeKind::Elementwise,
            Self::Reduce { .. } => NodeKind::Reduce,
        }
    }
}

/// Node in an expression tree.
#[derive(derive_more::Debug)]
pub struct Expr {
    /// Process-unique id, used for tracing and tree rendering only.
    pub id: u64,
    op: Op,
    #[debug(skip)]
    free_dims: DimSet,
}

impl Expr {
    fn new(op: Op, free_dims: DimSet) -> Arc<Self> {
        Arc::new(Self { id: next_expr_id(), op, free_dims })
    }

    pub fn leaf(operand: Operand) -> Arc<Self> {
        let free_dims = operand.dims.clone();
        Self::new(Op::Leaf(operand), free_dims)
    }

    pub fn try_unary(op: PointwiseOp, src: Arc<Self>) -> Result<Arc<Self>> {
        ensure!(op.arity() == Arity::Unary, ArityMismatchSnafu { op, expected: op.arity(), actual: 1usize });
        let free_dims = src.free_dims.clone();
        Ok(Self::new(Op::Unary(op, src), free_dims))
    }

    /// Binary input form. Accepts binary operators and associative ones.
    pub fn try_binary(op: PointwiseOp, lhs: Arc<Self>, rhs: Arc<Self>) -> Result<Arc<Self>> {
        ensure!(op.arity().accepts(2), ArityMismatchSnafu { op, expected: op.arity(), actual: 2usize });
        let free_dims = lhs.free_dims.union(&rhs.free_dims).cloned().collect();
        Ok(Self::new(Op::Binary(op, lhs, rhs), free_dims))
    }

    /// Pointwise `op` over `operands`; free dimensions are their union.
    pub fn try_elementwise(op: PointwiseOp, operands: impl IntoIterator<Item = Arc<Self>>) -> Result<Arc<Self>> {
        let operands: SmallVec<[Arc<Self>; 4]> = operands.into_iter().collect();
        ensure!(!operands.is_empty(), EmptyOperandsSnafu { op });
        ensure!(
            op.arity().accepts(operands.len()),
            ArityMismatchSnafu { op, expected: op.arity(), actual: operands.len() }
        );
        let free_dims = operands.iter().flat_map(|o| o.free_dims.iter().cloned()).collect();
        Ok(Self::new(Op::Elementwise { op, operands }, free_dims))
    }

    /// Fold `op` over `dims` of `src`. `dims` may be empty.
    pub fn try_reduce(op: ReduceOp, src: Arc<Self>, dims: DimSet) -> Result<Arc<Self>> {
        let stray: DimSet = dims.difference(&src.free_dims).cloned().collect();
        ensure!(stray.is_empty(), ReducedDimsNotFreeSnafu { dims: stray });
        let free_dims = src.free_dims.difference(&dims).cloned().collect();
        Ok(Self::new(Op::Reduce { op, src, dims }, free_dims))
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn kind(&self) -> NodeKind {
        self.op.kind()
    }

    /// Dimensions that survive this node.
    pub fn free_dims(&self) -> &DimSet {
        &self.free_dims
    }

    pub fn sources(&self) -> SmallVec<[&Arc<Self>; 4]> {
        self.op.sources()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Leaf(_))
    }

    /// Rebuild this node with new children, keeping operator and reduced dims.
    ///
    /// Goes through the checked constructors, so a child whose free dimensions
    /// no longer cover a reduction is rejected.
    pub fn with_sources(&self, sources: &[Arc<Self>]) -> Result<Arc<Self>> {
        match (&self.op, sources) {
            (Op::Leaf(operand), []) => Ok(Self::leaf(operand.clone())),
            (Op::Unary(op, _), [src]) => Self::try_unary(*op, src.clone()),
            (Op::Binary(op, ..), [lhs, rhs]) => Self::try_binary(*op, lhs.clone(), rhs.clone()),
            (Op::Elementwise { op, operands }, new) if new.len() == operands.len() => {
                Self::try_elementwise(*op, new.iter().cloned())
            }
            (Op::Reduce { op, dims, .. }, [src]) => Self::try_reduce(*op, src.clone(), dims.clone()),
            (op, new) => MalformedExpressionSnafu {
                reason: format!("{} node rebuilt with {} children, expected {}", op.kind(), new.len(), op.sources().len()),
            }
            .fail(),
        }
    }

    /// Number of nodes in the tree rooted here (shared subtrees counted once per use).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.sources().into_iter().map(|s| s.as_ref()));
        }
        count
    }

    /// Render this node and its sources as an ASCII tree, expanding shared
    /// subtrees at every occurrence.
    ///
    /// ```text
    /// [7] REDUCE(add, dims={b}) : {a, c}
    /// └── [6] ELEMENTWISE(mul, n=2) : {a, b, c}
    ///     ├── [4] LEAF(X) : {a, b}
    ///     └── [5] LEAF(Y) : {b, c}
    /// ```
    pub fn tree(self: &Arc<Self>) -> String {
        crate::tree::render_tree_full(self)
    }

    /// Like [`tree`](Self::tree), but a subtree seen before is printed as a back-reference.
    pub fn tree_compact(self: &Arc<Self>) -> String {
        crate::tree::render_tree_compact(self)
    }
}

/// Structural equality: ids are ignored.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.free_dims == other.free_dims && self.op == other.op)
    }
}

impl Eq for Expr {}

impl Classify for Expr {
    fn type_key(&self) -> TypeKey {
        self.kind().into()
    }
}
